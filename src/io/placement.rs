use crate::io::Appearance;
use crate::network::Part;

/// Strategy assigning a position to each exported part
pub trait Placement {
    /// Position of each part, given which parts are pinned
    fn positions(&self, pinned: &[bool]) -> Vec<[i32; 3]>;
}

/// Every part at the origin
#[derive(Debug, Clone, Copy, Default)]
pub struct AtOrigin;

impl Placement for AtOrigin {
    fn positions(&self, pinned: &[bool]) -> Vec<[i32; 3]> {
        vec![[0, 0, 0]; pinned.len()]
    }
}

/// Parts in a row along x, with the pinned parts on a separate row
#[derive(Debug, Clone, Copy)]
pub struct Linear {
    /// Distance between two neighbouring parts
    pub spacing: i32,
}

impl Default for Linear {
    fn default() -> Self {
        Linear { spacing: 1 }
    }
}

impl Placement for Linear {
    fn positions(&self, pinned: &[bool]) -> Vec<[i32; 3]> {
        let mut next = [0, 0];
        pinned
            .iter()
            .map(|p| {
                let row = usize::from(*p);
                let x = next[row] * self.spacing;
                next[row] += 1;
                [x, row as i32 * self.spacing, 0]
            })
            .collect()
    }
}

/// Set the position of every part, creating a default appearance where missing
pub fn place(parts: &mut [Part<Appearance>], placement: &dyn Placement) {
    let pinned = parts.iter().map(|p| p.pinned).collect::<Vec<_>>();
    let positions = placement.positions(&pinned);
    for (p, pos) in parts.iter_mut().zip(positions) {
        p.payload.get_or_insert_with(Appearance::default).pos = pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_origin() {
        assert_eq!(AtOrigin.positions(&[true, false]), vec![[0, 0, 0]; 2]);
    }

    #[test]
    fn test_linear() {
        let placement = Linear { spacing: 2 };
        assert_eq!(
            placement.positions(&[true, false, false, true, false]),
            vec![[0, 2, 0], [0, 0, 0], [2, 0, 0], [2, 2, 0], [4, 0, 0]]
        );
    }

    #[test]
    fn test_place() {
        use crate::network::generators::testcases;
        use crate::network::{CompileConfig, GateMode};

        let mut net = testcases::chain::<Appearance>(3, GateMode::And);
        net.compile(&CompileConfig::default());
        let mut parts = net.parts().unwrap();
        assert!(parts.iter().all(|p| p.payload.is_none()));
        place(&mut parts, &Linear::default());
        let pos = parts
            .iter()
            .map(|p| p.payload.as_ref().unwrap().pos)
            .collect::<Vec<_>>();
        assert_eq!(pos, vec![[0, 1, 0], [0, 0, 0], [1, 1, 0]]);
    }
}
