use std::num::NonZeroUsize;

use rand::Rng;

/// Produces the order in which `n` samples are visited using a bounded shuffle buffer.
///
/// The buffer starts with the first `buffer_size` indices. Each step emits a uniformly chosen
/// buffer slot and refills it with the next index; once every index was read the buffer is
/// drained in random order. A buffer of at least `n` gives a uniform permutation, a buffer of
/// one keeps the input order.
///
/// # Arguments
/// * `n` - The amount of samples.
/// * `buffer_size` - The maximum amount of indices held at once.
/// * `rng` - A random number generator.
///
/// # Returns
/// A permutation of `0..n`.
pub fn shuffle_indices<R>(n: usize, buffer_size: NonZeroUsize, rng: &mut R) -> Vec<usize>
where
    R: Rng + ?Sized,
{
    let mut input = 0..n;
    let mut buffer: Vec<usize> = input.by_ref().take(buffer_size.get()).collect();
    let mut order = Vec::with_capacity(n);

    while !buffer.is_empty() {
        let slot = rng.random_range(0..buffer.len());
        let index = match input.next() {
            Some(next) => std::mem::replace(&mut buffer[slot], next),
            None => buffer.swap_remove(slot),
        };

        order.push(index);
    }

    order
}
