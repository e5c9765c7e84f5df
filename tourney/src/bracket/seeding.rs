/// Seed numbers in bracket slot order for a power-of-two bracket
///
/// Adjacent pairs meet in the first round and the top seeds can only meet
/// late. For 8 entrants this yields `[1, 8, 4, 5, 2, 7, 3, 6]`.
pub fn bracket_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let doubled = order.len() * 2;
        order = order
            .into_iter()
            .flat_map(|seed| [seed, doubled + 1 - seed])
            .collect();
    }
    order
}
