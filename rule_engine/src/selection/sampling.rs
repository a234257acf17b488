//! Reducing a narrowed candidate list to the final result.

use world_model::Entity;

use super::PickStrategy;
use crate::context::RuleContext;

/// Reduce `candidates` by `strategy`.
///
/// `max_results` defaults to one pick for `random`, `weighted` and `first`,
/// and to no cap for `all`.
pub fn pick<'g>(
    candidates: Vec<&'g Entity>,
    strategy: PickStrategy,
    max_results: Option<usize>,
    ctx: &RuleContext<'g>,
) -> Vec<&'g Entity> {
    if candidates.is_empty() {
        return candidates;
    }

    match strategy {
        PickStrategy::All => match max_results {
            Some(n) => candidates.into_iter().take(n).collect(),
            None => candidates,
        },
        PickStrategy::First => candidates.into_iter().take(max_results.unwrap_or(1)).collect(),
        PickStrategy::Random => {
            let wanted = max_results.unwrap_or(1);
            if wanted == 1 {
                vec![candidates[ctx.draw_index(candidates.len())]]
            } else {
                shuffle(candidates, ctx).into_iter().take(wanted).collect()
            }
        }
        PickStrategy::Weighted => weighted(candidates, max_results.unwrap_or(1), ctx),
    }
}

/// Weight of an entity under the `weighted` strategy.
pub fn prominence_weight(entity: &Entity) -> f64 {
    (entity.prominence.index() + 1) as f64
}

/// Fisher-Yates shuffle driven by the context's random source.
fn shuffle<'g>(mut candidates: Vec<&'g Entity>, ctx: &RuleContext<'g>) -> Vec<&'g Entity> {
    for i in (1..candidates.len()).rev() {
        let j = ctx.draw_index(i + 1);
        candidates.swap(i, j);
    }
    candidates
}

/// Repeated weighted draws, removing each pick from the pool.
fn weighted<'g>(mut pool: Vec<&'g Entity>, wanted: usize, ctx: &RuleContext<'g>) -> Vec<&'g Entity> {
    let mut picked = Vec::with_capacity(wanted.min(pool.len()));

    while picked.len() < wanted && !pool.is_empty() {
        let total: f64 = pool.iter().map(|e| prominence_weight(e)).sum();
        let mut roll = ctx.draw() * total;
        let mut chosen = pool.len() - 1;
        for (i, entity) in pool.iter().enumerate() {
            roll -= prominence_weight(entity);
            if roll < 0.0 {
                chosen = i;
                break;
            }
        }
        picked.push(pool.remove(chosen));
    }
    picked
}
