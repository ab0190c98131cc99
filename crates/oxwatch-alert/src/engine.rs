use crate::rule::Rule;
use crate::{Alert, EntityKind};
use oxwatch_common::history::History;

/// Evaluates every rule against the latest committed cycle of `history`
/// and returns the indices of rules that tripped or recovered.
pub fn evaluate_rules(entity: &str, rules: &mut [Rule], history: &History) -> Vec<usize> {
    let mut notable = Vec::new();

    for (idx, rule) in rules.iter_mut().enumerate() {
        let sample = history.latest(&rule.key());
        let status = rule.evaluate(sample);

        tracing::debug!(
            entity,
            metric = %rule.metric(),
            ?sample,
            %status,
            consecutive = rule.consecutive(),
            "Rule evaluated"
        );

        if status.is_notable() {
            notable.push(idx);
        }
    }

    notable
}

/// Builds alerts for the rules at `indices`.
pub fn alerts_for<'a>(
    entity: &'a str,
    kind: EntityKind,
    rules: &'a [Rule],
    indices: &[usize],
) -> Vec<Alert<'a>> {
    indices
        .iter()
        .filter_map(|&idx| rules.get(idx))
        .map(|rule| Alert::new(entity, kind, rule))
        .collect()
}
