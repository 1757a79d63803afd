//! `connector`：词性接续表。
//!
//! 组句（beam search）时给相邻两词的词性对 `(prev, next)` 加接续权重，
//! 未登录的词性对按 0 处理（不奖励也不惩罚）。

use std::collections::HashMap;

/// 接续表：`(prev_pos, next_pos)` → 接续权重（越大越顺）。
#[derive(Debug, Default)]
pub struct Connector {
    weights: HashMap<(u16, u16), i32>,
}

impl Connector {
    pub fn from_pairs(pairs: Vec<(u16, u16, i32)>) -> Self {
        let mut weights = HashMap::with_capacity(pairs.len());
        for (prev, next, w) in pairs {
            weights.insert((prev, next), w);
        }
        Self { weights }
    }

    pub fn weight(&self, prev: u16, next: u16) -> i32 {
        self.weights.get(&(prev, next)).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_defaults_to_zero() {
        let c = Connector::from_pairs(vec![(1, 2, 3000), (2, 1, 500)]);
        assert_eq!(c.weight(1, 2), 3000);
        assert_eq!(c.weight(2, 1), 500);
        assert_eq!(c.weight(9, 9), 0);
        assert_eq!(c.len(), 2);
    }
}
