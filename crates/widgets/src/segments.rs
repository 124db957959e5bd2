//! Proportional allocation of a fixed number of character cells.

/// Cells handed to each weight, plus the rounding remainder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Cells per weight, in input order.
    pub units: Vec<usize>,
    /// Cells no weight claimed; drawn in the catch-all color.
    pub other: usize,
}

impl Allocation {
    pub fn total(&self) -> usize {
        self.units.iter().sum::<usize>() + self.other
    }
}

/// Split `width` cells between `weights` in proportion.
///
/// Weights are visited smallest first (ties in input order), each taking the
/// floor of its share. A weight that is nonzero but floors to zero still
/// gets one cell, so small shares stay visible. This holds however small
/// the share is: a weight of 1 out of 10^6 still takes a whole cell. Each
/// grant is clamped to what is left, and the remainder goes to
/// [`Allocation::other`]; the result always sums to `width`.
///
/// Returns `None` when all weights are zero.
pub fn allocate(weights: &[u64], width: usize) -> Option<Allocation> {
    let total: u128 = weights.iter().map(|&w| u128::from(w)).sum();
    if total == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by_key(|&i| weights[i]);

    let mut units = vec![0; weights.len()];
    let mut left = width;
    for i in order {
        let weight = u128::from(weights[i]);
        // weight <= total, so the share never exceeds width.
        let mut share = (weight * width as u128 / total) as usize;
        if share == 0 && weight > 0 {
            share = 1;
        }
        let share = share.min(left);
        units[i] = share;
        left -= share;
    }

    Some(Allocation { units, other: left })
}
