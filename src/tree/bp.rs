//! Balanced-parenthesis encoded phylogenetic tree.
//!
//! A tree of `n` nodes is a sequence of `2n` bits, `1` for an open parenthesis
//! and `0` for a close one, written in depth-first order. A node is identified by
//! the position of its open parenthesis, so the root is always position 0.
//!
//! All auxiliary tables are built once in the constructor and never change:
//!
//! | table     | content                                          |
//! |-----------|--------------------------------------------------|
//! | `r0`/`r1` | running count of closes / opens (rank)           |
//! | `s0`/`s1` | position of the k-th close / open (select)       |
//! | `partner` | matching parenthesis of every position           |
//! | `parent`  | enclosing open parenthesis of every open position |
//!
//! Names and branch lengths are stored once per node, indexed by postorder rank.
//! With these tables every accessor below is O(1), so the tree can be shared
//! read-only between threads without locking.

use bitvec::prelude::*;
use log::debug;

use super::occurrence::{seq_unique_indx_from_one, sum_val};
use crate::error::{PhyloError, Result};

/// Marker for "no parent" in the parent arena.
const NO_PARENT: u32 = u32::MAX;

/// Parse a string of `(` and `)` into a topology bit vector.
///
/// Whitespace is ignored; any other character is rejected.
pub fn topology_from_str(s: &str) -> Result<BitVec<u64, Lsb0>> {
    let mut bits = BitVec::<u64, Lsb0>::with_capacity(s.len());
    for (i, c) in s.chars().filter(|c| !c.is_whitespace()).enumerate() {
        match c {
            '(' => bits.push(true),
            ')' => bits.push(false),
            other => {
                return Err(PhyloError::MalformedTopology {
                    position: i,
                    reason: format!("unexpected character '{}'", other),
                })
            }
        }
    }
    Ok(bits)
}

/// Immutable succinct tree with names and branch lengths.
#[derive(Debug, Clone)]
pub struct SuccinctTree {
    bits: BitVec<u64, Lsb0>,
    r0: Vec<u32>,
    r1: Vec<u32>,
    s0: Vec<u32>,
    s1: Vec<u32>,
    partner: Vec<u32>,
    parent: Vec<u32>,
    /// names[k - 1] is the label of the k-th node in postorder
    names: Vec<String>,
    /// lengths[k - 1] is the branch length above the k-th node in postorder
    lengths: Vec<f64>,
    num_tips: usize,
}

impl SuccinctTree {
    /// Build a tree from position-indexed names and lengths.
    ///
    /// `names` and `lengths` must both have one entry per parenthesis; only the
    /// entries at open positions are read. The root's length is stored as 0
    /// whatever the input holds.
    pub fn new(topology: BitVec<u64, Lsb0>, names: Vec<String>, lengths: Vec<f64>) -> Result<Self> {
        let len = topology.len();
        let mut tree = Self::encode(topology)?;
        check_len("names", len, names.len())?;
        check_len("lengths", len, lengths.len())?;
        let size = tree.size();
        let mut post_names = vec![String::new(); size];
        let mut post_lengths = vec![0.0; size];
        for (pos, (name, length)) in names.into_iter().zip(lengths).enumerate() {
            if !tree.bits[pos] {
                continue;
            }
            let k = tree.postorder_unchecked(pos);
            post_names[k - 1] = name;
            post_lengths[k - 1] = length;
        }
        tree.set_payload(post_names, post_lengths)?;
        Ok(tree)
    }

    /// Build a tree whose names and lengths are listed in postorder.
    ///
    /// This is the layout upstream loaders emit: entry `k - 1` belongs to the
    /// node returned by `postorderselect(k)`.
    pub fn from_postorder(
        topology: BitVec<u64, Lsb0>,
        names: Vec<String>,
        lengths: Vec<f64>,
    ) -> Result<Self> {
        let mut tree = Self::encode(topology)?;
        let size = tree.size();
        check_len("names", size, names.len())?;
        check_len("lengths", size, lengths.len())?;
        tree.set_payload(names, lengths)?;
        Ok(tree)
    }

    // validates the parentheses and builds every auxiliary table
    fn encode(bits: BitVec<u64, Lsb0>) -> Result<Self> {
        let len = bits.len();
        if len == 0 {
            return Err(PhyloError::MalformedTopology {
                position: 0,
                reason: "empty topology".to_string(),
            });
        }
        if len >= NO_PARENT as usize {
            return Err(PhyloError::MalformedTopology {
                position: len,
                reason: "topology too large for 32-bit positions".to_string(),
            });
        }
        let mut partner = vec![0u32; len];
        let mut parent = vec![NO_PARENT; len];
        let mut stack: Vec<u32> = Vec::new();
        let mut num_tips = 0usize;
        for (i, bit) in bits.iter().by_vals().enumerate() {
            if bit {
                if stack.is_empty() && i != 0 {
                    return Err(PhyloError::MalformedTopology {
                        position: i,
                        reason: "more than one outermost pair".to_string(),
                    });
                }
                parent[i] = stack.last().copied().unwrap_or(NO_PARENT);
                stack.push(i as u32);
            } else {
                let open = stack.pop().ok_or_else(|| PhyloError::MalformedTopology {
                    position: i,
                    reason: "close without matching open".to_string(),
                })?;
                partner[open as usize] = i as u32;
                partner[i] = open;
                if open as usize + 1 == i {
                    num_tips += 1;
                }
            }
        }
        if !stack.is_empty() {
            return Err(PhyloError::MalformedTopology {
                position: len,
                reason: format!("{} unclosed parentheses", stack.len()),
            });
        }
        let r0 = sum_val(bits.iter().by_vals(), false);
        let r1 = sum_val(bits.iter().by_vals(), true);
        let s0 = seq_unique_indx_from_one(&r0);
        let s1 = seq_unique_indx_from_one(&r1);
        debug!(
            "SuccinctTree encoded: {} parentheses, {} nodes, {} tips",
            len,
            len / 2,
            num_tips
        );
        Ok(Self {
            bits,
            r0,
            r1,
            s0,
            s1,
            partner,
            parent,
            names: Vec::new(),
            lengths: Vec::new(),
            num_tips,
        })
    }

    fn set_payload(&mut self, names: Vec<String>, mut lengths: Vec<f64>) -> Result<()> {
        let size = self.size();
        for (k, &length) in lengths.iter().enumerate().take(size - 1) {
            if !length.is_finite() || length < 0.0 {
                return Err(PhyloError::InvalidBranchLength {
                    position: self.postorder_select_unchecked(k + 1),
                    length,
                });
            }
        }
        lengths[size - 1] = 0.0;
        self.names = names;
        self.lengths = lengths;
        Ok(())
    }

    /// Number of nodes.
    pub fn size(&self) -> usize {
        self.bits.len() / 2
    }

    /// Position of the root. Construction rejects anything but a single
    /// outermost pair, so this is always 0.
    pub fn root(&self) -> usize {
        0
    }

    /// Position of the `k`-th node in postorder, `1 <= k <= size()`.
    pub fn postorderselect(&self, k: usize) -> Result<usize> {
        self.check_rank(k)?;
        Ok(self.postorder_select_unchecked(k))
    }

    /// Position of the `k`-th node in preorder, `1 <= k <= size()`.
    pub fn preorderselect(&self, k: usize) -> Result<usize> {
        self.check_rank(k)?;
        Ok(self.s1[k - 1] as usize)
    }

    /// Postorder rank (1-based) of the node at `pos`.
    pub fn postorder(&self, pos: usize) -> Result<usize> {
        self.check_node(pos)?;
        Ok(self.postorder_unchecked(pos))
    }

    /// Preorder rank (1-based) of the node at `pos`.
    pub fn preorder(&self, pos: usize) -> Result<usize> {
        self.check_node(pos)?;
        Ok(self.r1[pos] as usize)
    }

    /// Label of the node at `pos`. Internal nodes may have an empty label.
    pub fn name(&self, pos: usize) -> Result<&str> {
        self.check_node(pos)?;
        Ok(&self.names[self.postorder_unchecked(pos) - 1])
    }

    /// Branch length above the node at `pos`; 0 for the root.
    pub fn length(&self, pos: usize) -> Result<f64> {
        self.check_node(pos)?;
        Ok(self.lengths[self.postorder_unchecked(pos) - 1])
    }

    /// True if `pos` holds an open parenthesis.
    pub fn is_open(&self, pos: usize) -> bool {
        pos < self.bits.len() && self.bits[pos]
    }

    /// Number of `bit` parentheses in `[0, pos]`.
    pub fn rank(&self, bit: bool, pos: usize) -> Result<usize> {
        if pos >= self.bits.len() {
            return Err(PhyloError::UnknownPosition(pos));
        }
        let count = if bit { self.r1[pos] } else { self.r0[pos] };
        Ok(count as usize)
    }

    /// Position of the `k`-th `bit` parenthesis, `1 <= k <= size()`.
    pub fn select(&self, bit: bool, k: usize) -> Result<usize> {
        self.check_rank(k)?;
        let pos = if bit { self.s1[k - 1] } else { self.s0[k - 1] };
        Ok(pos as usize)
    }

    /// Opens minus closes in `[0, pos]`.
    pub fn excess(&self, pos: usize) -> Result<usize> {
        if pos >= self.bits.len() {
            return Err(PhyloError::UnknownPosition(pos));
        }
        Ok((self.r1[pos] - self.r0[pos]) as usize)
    }

    /// Depth of the node at `pos`, the root being at depth 0.
    pub fn depth(&self, pos: usize) -> Result<usize> {
        self.check_node(pos)?;
        Ok((self.r1[pos] - self.r0[pos]) as usize - 1)
    }

    /// Matching close parenthesis of an open one, or `pos` itself if already closed.
    pub fn close(&self, pos: usize) -> Result<usize> {
        if pos >= self.bits.len() {
            return Err(PhyloError::UnknownPosition(pos));
        }
        Ok(if self.bits[pos] {
            self.partner[pos] as usize
        } else {
            pos
        })
    }

    /// Matching open parenthesis of a close one, or `pos` itself if already open.
    pub fn open(&self, pos: usize) -> Result<usize> {
        if pos >= self.bits.len() {
            return Err(PhyloError::UnknownPosition(pos));
        }
        Ok(if self.bits[pos] {
            pos
        } else {
            self.partner[pos] as usize
        })
    }

    /// Parent of the node at `pos`; `None` for the root.
    pub fn parent(&self, pos: usize) -> Result<Option<usize>> {
        self.check_node(pos)?;
        let p = self.parent[pos];
        Ok((p != NO_PARENT).then_some(p as usize))
    }

    pub fn first_child(&self, pos: usize) -> Result<Option<usize>> {
        self.check_node(pos)?;
        Ok(self.bits[pos + 1].then_some(pos + 1))
    }

    pub fn last_child(&self, pos: usize) -> Result<Option<usize>> {
        self.check_node(pos)?;
        let before_close = self.partner[pos] as usize - 1;
        Ok((!self.bits[before_close]).then(|| self.partner[before_close] as usize))
    }

    pub fn next_sibling(&self, pos: usize) -> Result<Option<usize>> {
        self.check_node(pos)?;
        let next = self.partner[pos] as usize + 1;
        Ok((next < self.bits.len() && self.bits[next]).then_some(next))
    }

    pub fn prev_sibling(&self, pos: usize) -> Result<Option<usize>> {
        self.check_node(pos)?;
        if pos == 0 || self.bits[pos - 1] {
            return Ok(None);
        }
        Ok(Some(self.partner[pos - 1] as usize))
    }

    /// True if the node at `pos` has no children.
    pub fn is_leaf(&self, pos: usize) -> Result<bool> {
        self.check_node(pos)?;
        Ok(self.partner[pos] as usize == pos + 1)
    }

    /// Number of leaves.
    pub fn num_tips(&self) -> usize {
        self.num_tips
    }

    /// Leaf positions in postorder.
    pub fn tips(&self) -> Vec<usize> {
        self.postorder_positions()
            .filter(|&pos| self.partner[pos] as usize == pos + 1)
            .collect()
    }

    /// Sum of every branch length (the root contributes 0).
    pub fn total_length(&self) -> f64 {
        self.lengths.iter().sum()
    }

    /// Positions of every node labelled `name`, in postorder.
    ///
    /// This is a linear scan over the name arena.
    pub fn positions_with_name(&self, name: &str) -> Vec<usize> {
        self.names
            .iter()
            .enumerate()
            .filter(|(_, n)| n.as_str() == name)
            .map(|(k, _)| self.postorder_select_unchecked(k + 1))
            .collect()
    }

    /// Node positions in postorder, children before parents.
    pub fn postorder_positions(&self) -> impl Iterator<Item = usize> + '_ {
        self.s0.iter().map(move |&c| self.partner[c as usize] as usize)
    }

    /// The raw topology.
    pub fn topology(&self) -> &BitSlice<u64, Lsb0> {
        &self.bits
    }

    #[inline]
    fn postorder_unchecked(&self, pos: usize) -> usize {
        self.r0[self.partner[pos] as usize] as usize
    }

    #[inline]
    fn postorder_select_unchecked(&self, k: usize) -> usize {
        self.partner[self.s0[k - 1] as usize] as usize
    }

    fn check_rank(&self, k: usize) -> Result<()> {
        let size = self.size();
        if k == 0 || k > size {
            return Err(PhyloError::IndexOutOfRange { index: k, size });
        }
        Ok(())
    }

    fn check_node(&self, pos: usize) -> Result<()> {
        if self.is_open(pos) {
            Ok(())
        } else {
            Err(PhyloError::UnknownPosition(pos))
        }
    }
}

fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
    if expected != found {
        return Err(PhyloError::LengthMismatch {
            what,
            expected,
            found,
        });
    }
    Ok(())
}

//=======================================================================================
