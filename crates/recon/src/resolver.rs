//! Tiered candidate → catalog row matching.
//!
//! Tiers, first hit wins:
//! 1. a catalog code key occurs inside the context key
//! 2. among that code's rows, the attribute key decides 100 vs 90
//! 3. otherwise the best fuzzy score against `code + attribute`, capped at 89,
//!    if at the floor (a floor of 90 or more disables this tier)
//! 4. otherwise unresolved (confidence 0)

use crate::catalog::CatalogIndex;
use crate::config::MatchSettings;
use crate::model::{CandidateRecord, MatchMethod, Resolution};
use crate::normalize::{normalize_display, normalize_key};
use crate::similarity::{best_match, Scorer};

pub const CONFIDENCE_CODE_AND_ATTRIBUTE: u8 = 100;
pub const CONFIDENCE_CODE_ONLY: u8 = 90;
/// Fuzzy hits are reported below the code-only band.
pub const FUZZY_CONFIDENCE_CEILING: u8 = CONFIDENCE_CODE_ONLY - 1;

pub struct Resolver<'a, S: Scorer + ?Sized> {
    index: &'a CatalogIndex<'a>,
    scorer: &'a S,
    settings: &'a MatchSettings,
}

impl<'a, S: Scorer + ?Sized> Resolver<'a, S> {
    pub fn new(index: &'a CatalogIndex<'a>, scorer: &'a S, settings: &'a MatchSettings) -> Self {
        Self {
            index,
            scorer,
            settings,
        }
    }

    pub fn resolve(&self, candidate: &CandidateRecord) -> Resolution {
        let (matched_row, confidence, method) = self
            .match_by_code(candidate)
            .or_else(|| self.match_fuzzy(candidate))
            .unwrap_or((None, 0, MatchMethod::Unresolved));

        log::debug!(
            "{:?} (qty {}) -> row {:?}, {} ({})",
            candidate.context,
            candidate.quantity,
            matched_row,
            method,
            confidence
        );

        Resolution {
            candidate: candidate.clone(),
            matched_row,
            confidence,
            method,
        }
    }

    fn match_by_code(&self, candidate: &CandidateRecord) -> Option<(Option<usize>, u8, MatchMethod)> {
        let context_key = normalize_key(&candidate.context);
        let code_key = self.index.find_code_in(&context_key, self.settings.code_tie_break)?;
        let rows = self.index.rows_by_code_key(code_key);
        let first = *rows.first()?;

        let attribute_key = normalize_key(&candidate.attribute_guess);
        let same_attribute = rows.iter().copied().find(|&i| {
            self.index
                .row(i)
                .is_some_and(|row| row.attribute_key() == attribute_key)
        });

        Some(match same_attribute {
            Some(i) => (Some(i), CONFIDENCE_CODE_AND_ATTRIBUTE, MatchMethod::CodeAndAttribute),
            None => (Some(first), CONFIDENCE_CODE_ONLY, MatchMethod::CodeOnly),
        })
    }

    fn match_fuzzy(&self, candidate: &CandidateRecord) -> Option<(Option<usize>, u8, MatchMethod)> {
        let query = normalize_display(&candidate.context);
        let (i, score) = best_match(self.scorer, &query, self.index.all_combined_texts())?;
        // The floor applies to the reported confidence, so floors above the
        // ceiling turn this tier off.
        let confidence = score.min(FUZZY_CONFIDENCE_CEILING);
        if confidence < self.settings.fuzzy_min_score {
            log::trace!("best fuzzy score {score} for {query:?} below floor");
            return None;
        }
        Some((Some(i), confidence, MatchMethod::Fuzzy))
    }
}
