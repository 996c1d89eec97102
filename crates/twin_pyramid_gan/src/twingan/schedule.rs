/// Index of the oldest generator sub-block that still trains when the
/// model has `stages_total` blocks and the last `train_depth` of them
/// stay trainable. Everything below is frozen.
pub fn first_trainable_block(stages_total: usize, train_depth: usize) -> usize {
    stages_total.saturating_sub(train_depth)
}

/// Per-parameter-group learning rates for one stage of generator
/// training. Block entries are (absolute block index, rate).
#[derive(Debug, Clone, PartialEq)]
pub struct LrGroups {
    pub head: Option<f64>,
    pub body: Vec<(usize, f64)>,
    pub tail: f64,
}

impl LrGroups {
    /// Newest trainable block gets the base rate; each older block in the
    /// window decays by `lr_scale` per step of distance from the newest.
    /// The head only trains while the model is still shallower than
    /// `train_depth`; the tail always trains at the base rate.
    pub fn for_stage(stage: usize, train_depth: usize, lr_g: f64, lr_scale: f64) -> Self {
        let stages_total = stage + 1;
        let first = first_trainable_block(stages_total, train_depth);
        let body = (first..stages_total)
            .map(|idx| {
                let from_newest = stages_total - 1 - idx;
                (idx, lr_g * lr_scale.powi(from_newest as i32))
            })
            .collect();
        let head = if stage < train_depth {
            Some(lr_g * lr_scale.powi(stage as i32))
        } else {
            None
        };
        Self {
            head,
            body,
            tail: lr_g,
        }
    }
}

/// Single-milestone step decay: the rate drops by `gamma` once the
/// iteration count passes `frac` of the stage budget.
#[derive(Debug, Clone, Copy)]
pub struct MilestoneDecay {
    milestone: usize,
    gamma: f64,
}

impl MilestoneDecay {
    pub fn new(niter: usize, frac: f64, gamma: f64) -> Self {
        Self {
            milestone: (frac * niter as f64).floor() as usize,
            gamma,
        }
    }

    pub fn at(&self, base: f64, iter: usize) -> f64 {
        if iter >= self.milestone {
            base * self.gamma
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn newest_block_trains_at_base_rate() {
        let groups = LrGroups::for_stage(4, 3, 5e-4, 0.1);
        assert_eq!(groups.body.len(), 3);
        assert_eq!(groups.body[2].0, 4);
        assert!(close(groups.body[2].1, 5e-4));
        assert!(close(groups.body[1].1, 5e-5));
        assert!(close(groups.body[0].1, 5e-6));
        assert!(close(groups.tail, 5e-4));
    }

    #[test]
    fn head_stops_training_once_stage_leaves_window() {
        let early = LrGroups::for_stage(2, 3, 5e-4, 0.1);
        assert!(early.head.is_some_and(|lr| close(lr, 5e-6)));
        let late = LrGroups::for_stage(3, 3, 5e-4, 0.1);
        assert!(late.head.is_none());
    }

    #[test]
    fn shallow_models_train_every_block() {
        let groups = LrGroups::for_stage(1, 3, 5e-4, 0.1);
        assert_eq!(groups.body.len(), 2);
        assert_eq!(groups.body[0].0, 0);
    }

    #[test]
    fn frozen_window_starts_below_train_depth() {
        assert_eq!(first_trainable_block(6, 3), 3);
        assert_eq!(first_trainable_block(2, 3), 0);
    }

    #[test]
    fn rate_drops_once_past_milestone() {
        let decay = MilestoneDecay::new(10, 0.8, 0.1);
        assert!(close(decay.at(0.5, 7), 0.5));
        assert!(close(decay.at(0.5, 8), 0.05));
        assert!(close(decay.at(0.5, 9), 0.05));
    }
}
