/// Zombie AI: an aimless wanderer.
///
/// No pathfinding. Each eligible step the zombie picks left, stay or
/// right with equal odds and walks through the same movement resolver
/// the players use, so it pushes boxes exactly like they do.

use rand::Rng;

/// Horizontal direction for the next zombie move: -1, 0 or +1.
pub fn wander<R: Rng + ?Sized>(rng: &mut R) -> i32 {
    match rng.gen_range(0..3) {
        0 => 0,
        1 => 1,
        _ => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn wander_covers_all_three_choices() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..200 {
            let d = wander(&mut rng);
            assert!((-1..=1).contains(&d));
            seen[(d + 1) as usize] = true;
        }
        assert_eq!(seen, [true, true, true]);
    }
}
