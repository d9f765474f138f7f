//! Encode a Newick string as a [`SuccinctTree`].

use bitvec::prelude::*;
use log::debug;
use newick::{one_from_string, NewickTree};

use super::bp::SuccinctTree;
use crate::error::{PhyloError, Result};

impl SuccinctTree {
    /// Parse `newick_str` and encode it.
    ///
    /// Children keep their Newick order. Missing branch lengths become 0 and
    /// unnamed nodes get an empty label. The traversal uses an explicit stack,
    /// so deep caterpillar trees do not overflow.
    pub fn from_newick(newick_str: &str) -> Result<Self> {
        let t: NewickTree =
            one_from_string(newick_str).map_err(|e| PhyloError::Newick(e.to_string()))?;

        let mut bits = BitVec::<u64, Lsb0>::new();
        let mut names = Vec::<String>::new();
        let mut lengths = Vec::<f64>::new();

        // (newick node id, closing?)
        let mut stack = vec![(t.root(), false)];
        while let Some((id, closing)) = stack.pop() {
            if closing {
                bits.push(false);
                names.push(String::new());
                lengths.push(0.0);
                continue;
            }
            bits.push(true);
            names.push(t[id].data().name.clone().unwrap_or_default());
            lengths.push(t[id].branch().copied().unwrap_or(0.0) as f64);
            stack.push((id, true));
            for &c in t[id].children().iter().rev() {
                stack.push((c, false));
            }
        }
        debug!("from_newick: {} nodes parsed", bits.len() / 2);
        SuccinctTree::new(bits, names, lengths)
    }
}

//=======================================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_newick_postorder_names() -> anyhow::Result<()> {
        let t = SuccinctTree::from_newick("((A:1,B:2)C:0.5,D:3)R:7;")?;
        assert_eq!(t.size(), 5);
        let names = (1..=t.size())
            .map(|k| t.postorderselect(k).and_then(|p| t.name(p)).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(names, vec!["A", "B", "C", "D", "R"]);
        assert_eq!(t.topology().len(), 10);
        assert_eq!(t.length(t.root())?, 0.0);
        let d = t.positions_with_name("D");
        assert_eq!(d.len(), 1);
        assert_eq!(t.length(d[0])?, 3.0);
        assert!((t.total_length() - 6.5).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_from_newick_missing_lengths_and_labels() -> anyhow::Result<()> {
        let t = SuccinctTree::from_newick("((T1,T2),T3);")?;
        assert_eq!(t.num_tips(), 3);
        for pos in t.postorder_positions() {
            assert_eq!(t.length(pos)?, 0.0);
        }
        let internal = t.first_child(t.root())?.expect("root has children");
        assert_eq!(t.name(internal)?, "");
        Ok(())
    }

    #[test]
    fn test_from_newick_rejects_garbage() {
        assert!(matches!(
            SuccinctTree::from_newick("((A,B;"),
            Err(PhyloError::Newick(_))
        ));
    }
}
