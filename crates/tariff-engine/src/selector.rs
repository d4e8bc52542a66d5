use chrono::NaiveDate;
use tariff_models::rate::RateCandidate;
use tracing::warn;

/// Pick the rate record in force on `as_of`.
///
/// Keeps candidates with `valid_from <= as_of <= valid_to` (open-ended when `valid_to`
/// is None) and returns the one with the latest `valid_from`. Candidates sharing that
/// `valid_from` keep the store's order: the first one wins.
pub fn select_applicable(candidates: &[RateCandidate], as_of: NaiveDate) -> Option<&RateCandidate> {
    let mut best: Option<&RateCandidate> = None;
    let mut ties = 0usize;

    for candidate in candidates.iter().filter(|c| c.is_valid_on(as_of)) {
        match best {
            Some(current) if candidate.valid_from > current.valid_from => {
                best = Some(candidate);
                ties = 0;
            }
            Some(current) if candidate.valid_from == current.valid_from => ties += 1,
            Some(_) => {}
            None => best = Some(candidate),
        }
    }

    if let Some(chosen) = best {
        if ties > 0 {
            warn!(
                rate_id = ?chosen.id,
                basis = %chosen.basis,
                valid_from = %chosen.valid_from,
                ties,
                "Overlapping rates share valid_from; keeping the first returned by the store"
            );
        }
    }

    best
}
