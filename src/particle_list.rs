// Per-event particle store
//
// Holds the primaries of one event and every secondary created during its
// cascade. Particles are addressed by insertion index; indices stay valid for
// the lifetime of the list because particles are never physically removed.

use std::ops::{Index, IndexMut};

use crate::particle::{Particle, Species};

/// Ordered, growing collection of the particles of a single event.
///
/// The event loop walks the list by index and re-reads [`ParticleList::len`]
/// on every iteration, so a particle appended while the list is being
/// traversed is visited later in the same traversal.
#[derive(Debug, Clone, Default)]
pub struct ParticleList {
    particles: Vec<Particle>,
}

impl ParticleList {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
        }
    }

    /// Append a particle, taking ownership, and return its index.
    pub fn push(&mut self, particle: Particle) -> usize {
        self.particles.push(particle);
        self.particles.len() - 1
    }

    /// Number of particle slots, including consumed particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.particles.iter()
    }

    /// Particles that have not been consumed by a process.
    pub fn alive(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.alive)
    }

    pub fn n_alive(&self) -> usize {
        self.alive().count()
    }

    /// Alive particles of one species.
    pub fn of_species(&self, species: Species) -> impl Iterator<Item = &Particle> {
        self.alive().filter(move |p| p.species == species)
    }

    /// Release every particle held by the list.
    pub fn clear(&mut self) {
        self.particles.clear();
    }
}

impl Index<usize> for ParticleList {
    type Output = Particle;

    fn index(&self, index: usize) -> &Particle {
        &self.particles[index]
    }
}

impl IndexMut<usize> for ParticleList {
    fn index_mut(&mut self, index: usize) -> &mut Particle {
        &mut self.particles[index]
    }
}

impl FromIterator<Particle> for ParticleList {
    fn from_iter<I: IntoIterator<Item = Particle>>(iter: I) -> Self {
        Self {
            particles: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ParticleList {
    type Item = &'a Particle;
    type IntoIter = std::slice::Iter<'a, Particle>;

    fn into_iter(self) -> Self::IntoIter {
        self.particles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematics::ThreeVector;

    fn electron(pz: f64) -> Particle {
        Particle::new(
            Species::Electron,
            ThreeVector::zeros(),
            ThreeVector::new(0.0, 0.0, pz),
            0.0,
        )
    }

    #[test]
    fn test_particle_list_basic() {
        let mut list = ParticleList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);

        let index = list.push(electron(1.0));
        assert_eq!(index, 0);
        assert_eq!(list.len(), 1);
        assert!(!list.is_empty());
        assert_eq!(list[0].momentum.z, 1.0);
        assert!(list.get(1).is_none());
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let mut list = ParticleList::with_capacity(4);
        for i in 0..4 {
            assert_eq!(list.push(electron(i as f64)), i);
        }
        let momenta: Vec<f64> = list.iter().map(|p| p.momentum.z).collect();
        assert_eq!(momenta, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_growth_during_index_traversal() {
        // The event loop pattern: re-read len() every iteration
        let mut list = ParticleList::new();
        list.push(electron(1.0));

        let mut visited = 0;
        let mut k = 0;
        while k < list.len() {
            visited += 1;
            if list.len() < 3 {
                let p = list[k].clone().with_parent(k);
                list.push(p);
            }
            k += 1;
        }
        assert_eq!(list.len(), 3);
        assert_eq!(visited, 3);
        assert_eq!(list[2].parent, Some(1));
    }

    #[test]
    fn test_consumed_particles_keep_their_slot() {
        let mut list: ParticleList = (0..3).map(|i| electron(i as f64)).collect();
        list[1].alive = false;
        assert_eq!(list.len(), 3);
        assert_eq!(list.n_alive(), 2);
        let alive: Vec<f64> = list.alive().map(|p| p.momentum.z).collect();
        assert_eq!(alive, vec![0.0, 2.0]);
        assert_eq!(list[2].momentum.z, 2.0);
    }

    #[test]
    fn test_of_species() {
        let mut list = ParticleList::new();
        list.push(electron(1.0));
        list.push(Particle::photon(
            1.0,
            ThreeVector::zeros(),
            &ThreeVector::new(1.0, 0.0, 0.0),
            0.0,
        ));
        assert_eq!(list.of_species(Species::Photon).count(), 1);
        assert_eq!(list.of_species(Species::Electron).count(), 1);
        assert_eq!(list.of_species(Species::Positron).count(), 0);
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut list: ParticleList = (0..5).map(|_| electron(1.0)).collect();
        list.clear();
        assert!(list.is_empty());
    }
}
