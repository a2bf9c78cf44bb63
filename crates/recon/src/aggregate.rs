use crate::error::ReconError;
use crate::model::{
    AuditLogEntry, CatalogRow, MatchMethod, QuarantineRecord, ReconSummary, Resolution,
    UNMATCHED_PLACEHOLDER,
};

/// Collects resolutions into an increment vector, a quarantine list and the
/// audit log. Never touches the catalog itself; see [`apply_increments`].
pub struct Aggregator<'a> {
    rows: &'a [CatalogRow],
    increments: Vec<i64>,
    quarantine: Vec<QuarantineRecord>,
    audit_log: Vec<AuditLogEntry>,
    summary: ReconSummary,
}

/// Everything one pass produced besides the merged catalog.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub increments: Vec<i64>,
    pub quarantine: Vec<QuarantineRecord>,
    pub audit_log: Vec<AuditLogEntry>,
    pub summary: ReconSummary,
}

impl<'a> Aggregator<'a> {
    pub fn new(rows: &'a [CatalogRow]) -> Self {
        Self {
            rows,
            increments: vec![0; rows.len()],
            quarantine: Vec::new(),
            audit_log: Vec::new(),
            summary: ReconSummary {
                catalog_rows: rows.len(),
                ..ReconSummary::default()
            },
        }
    }

    /// Fold one resolution in. Fails with `MalformedInput` when a quantity
    /// would overflow a row increment or a summary total; nothing is
    /// recorded for that resolution then.
    pub fn record(&mut self, resolution: &Resolution) -> Result<(), ReconError> {
        let candidate = &resolution.candidate;
        let position = self.summary.candidates;
        let overflow = || {
            let source = if candidate.source_tag.is_empty() {
                "candidates"
            } else {
                candidate.source_tag.as_str()
            };
            ReconError::malformed(
                source,
                position,
                format!("quantity {} overflows the running total", candidate.quantity),
            )
        };

        let candidate_quantity = self
            .summary
            .candidate_quantity
            .checked_add(candidate.quantity)
            .ok_or_else(overflow)?;

        let matched = resolution
            .matched_row
            .and_then(|i| self.rows.get(i).map(|row| (i, row)));

        match matched {
            Some((i, row)) => {
                let increment = self.increments[i]
                    .checked_add(candidate.quantity)
                    .ok_or_else(overflow)?;
                let matched_quantity = self
                    .summary
                    .matched_quantity
                    .checked_add(candidate.quantity)
                    .ok_or_else(overflow)?;

                self.increments[i] = increment;
                self.summary.matched_quantity = matched_quantity;
                self.summary.resolved += 1;
                match resolution.method {
                    MatchMethod::CodeAndAttribute => self.summary.code_and_attribute += 1,
                    MatchMethod::CodeOnly => self.summary.code_only += 1,
                    MatchMethod::Fuzzy => self.summary.fuzzy += 1,
                    MatchMethod::Unresolved => {}
                }
                self.audit_log.push(AuditLogEntry {
                    context: candidate.context.clone(),
                    matched_code: row.code().to_string(),
                    matched_attribute: row.attribute().to_string(),
                    confidence: resolution.confidence,
                    method: resolution.method,
                    row: Some(i),
                    source_tag: candidate.source_tag.clone(),
                });
            }
            None => {
                let quarantined_quantity = self
                    .summary
                    .quarantined_quantity
                    .checked_add(candidate.quantity)
                    .ok_or_else(overflow)?;

                self.summary.quarantined_quantity = quarantined_quantity;
                self.summary.quarantined += 1;
                self.quarantine.push(QuarantineRecord {
                    context: candidate.context.clone(),
                    attribute_guess: candidate.attribute_guess.clone(),
                    quantity: candidate.quantity,
                    source_tag: candidate.source_tag.clone(),
                });
                self.audit_log.push(AuditLogEntry {
                    context: candidate.context.clone(),
                    matched_code: UNMATCHED_PLACEHOLDER.to_string(),
                    matched_attribute: UNMATCHED_PLACEHOLDER.to_string(),
                    confidence: 0,
                    method: MatchMethod::Unresolved,
                    row: None,
                    source_tag: candidate.source_tag.clone(),
                });
            }
        }

        self.summary.candidates += 1;
        self.summary.candidate_quantity = candidate_quantity;
        Ok(())
    }

    pub fn finish(self) -> Aggregation {
        Aggregation {
            increments: self.increments,
            quarantine: self.quarantine,
            audit_log: self.audit_log,
            summary: self.summary,
        }
    }
}

/// Merge step: snapshot quantities plus this pass's increments. A row whose
/// new quantity does not fit in `i64` is reported as malformed catalog input.
pub fn apply_increments(rows: &[CatalogRow], increments: &[i64]) -> Result<Vec<CatalogRow>, ReconError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let increment = increments.get(i).copied().unwrap_or(0);
            let quantity = row.quantity.checked_add(increment).ok_or_else(|| {
                ReconError::malformed(
                    "catalog",
                    i,
                    format!("quantity {} plus {increment} overflows", row.quantity),
                )
            })?;
            let mut updated = row.clone();
            updated.quantity = quantity;
            Ok(updated)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CandidateRecord;

    fn resolution(context: &str, qty: i64, row: Option<usize>, confidence: u8, method: MatchMethod) -> Resolution {
        Resolution {
            candidate: CandidateRecord {
                context: context.into(),
                quantity: qty,
                attribute_guess: "แดง".into(),
                source_tag: "a.pdf".into(),
                page: 1,
            },
            matched_row: row,
            confidence,
            method,
        }
    }

    #[test]
    fn increments_are_additive() {
        let rows = vec![CatalogRow::new("AB-123", "แดง", 5), CatalogRow::new("CD-9", "", 1)];
        let mut agg = Aggregator::new(&rows);
        agg.record(&resolution("AB123 แดง", 3, Some(0), 100, MatchMethod::CodeAndAttribute)).unwrap();
        agg.record(&resolution("AB123", 2, Some(0), 90, MatchMethod::CodeOnly)).unwrap();
        let out = agg.finish();
        assert_eq!(out.increments, vec![5, 0]);

        let merged = apply_increments(&rows, &out.increments).unwrap();
        assert_eq!(merged[0].quantity, 10);
        assert_eq!(merged[1].quantity, 1);
        // Snapshot untouched.
        assert_eq!(rows[0].quantity, 5);
    }

    #[test]
    fn unresolved_goes_to_quarantine_and_log() {
        let rows = vec![CatalogRow::new("AB-123", "แดง", 5)];
        let mut agg = Aggregator::new(&rows);
        agg.record(&resolution("mystery item", 4, None, 0, MatchMethod::Unresolved)).unwrap();
        agg.record(&resolution("AB123", 1, Some(0), 90, MatchMethod::CodeOnly)).unwrap();
        let out = agg.finish();

        assert_eq!(out.quarantine.len(), 1);
        assert_eq!(out.quarantine[0].context, "mystery item");
        assert_eq!(out.quarantine[0].attribute_guess, "แดง");
        assert_eq!(out.quarantine[0].quantity, 4);

        assert_eq!(out.audit_log.len(), 2);
        assert_eq!(out.audit_log[0].matched_code, "-");
        assert_eq!(out.audit_log[0].matched_attribute, "-");
        assert_eq!(out.audit_log[0].confidence, 0);
        assert_eq!(out.audit_log[1].matched_code, "AB-123");
        assert_eq!(out.audit_log[1].matched_attribute, "แดง");
        assert_eq!(out.audit_log[1].row, Some(0));
    }

    #[test]
    fn summary_accounts_for_everything() {
        let rows = vec![CatalogRow::new("AB-123", "แดง", 5)];
        let mut agg = Aggregator::new(&rows);
        agg.record(&resolution("a", 3, Some(0), 100, MatchMethod::CodeAndAttribute)).unwrap();
        agg.record(&resolution("b", 2, Some(0), 90, MatchMethod::CodeOnly)).unwrap();
        agg.record(&resolution("c", 1, Some(0), 70, MatchMethod::Fuzzy)).unwrap();
        agg.record(&resolution("d", 7, None, 0, MatchMethod::Unresolved)).unwrap();
        let s = agg.finish().summary;
        assert_eq!(s.catalog_rows, 1);
        assert_eq!(s.candidates, 4);
        assert_eq!(s.resolved, 3);
        assert_eq!((s.code_and_attribute, s.code_only, s.fuzzy), (1, 1, 1));
        assert_eq!(s.quarantined, 1);
        assert_eq!(s.candidate_quantity, 13);
        assert_eq!(s.matched_quantity, 6);
        assert_eq!(s.quarantined_quantity, 7);
    }

    #[test]
    fn row_outside_catalog_is_quarantined() {
        let rows = vec![CatalogRow::new("AB-123", "แดง", 5)];
        let mut agg = Aggregator::new(&rows);
        agg.record(&resolution("x", 2, Some(9), 90, MatchMethod::CodeOnly)).unwrap();
        let out = agg.finish();
        assert_eq!(out.increments, vec![0]);
        assert_eq!(out.quarantine.len(), 1);
        assert_eq!(out.audit_log[0].method, MatchMethod::Unresolved);
    }

    #[test]
    fn overflowing_total_is_rejected() {
        let rows = vec![CatalogRow::new("AB-123", "", 5)];
        let mut agg = Aggregator::new(&rows);
        agg.record(&resolution("AB-123", i64::MAX, Some(0), 100, MatchMethod::CodeAndAttribute)).unwrap();
        let err = agg
            .record(&resolution("AB-123", 1, Some(0), 100, MatchMethod::CodeAndAttribute))
            .unwrap_err();
        match err {
            ReconError::MalformedInput { source, index, reason } => {
                assert_eq!(source, "a.pdf");
                assert_eq!(index, 1);
                assert!(reason.contains("overflows"));
            }
            other => panic!("unexpected {other:?}"),
        }
        // The failed record left no trace.
        let out = agg.finish();
        assert_eq!(out.increments, vec![i64::MAX]);
        assert_eq!(out.summary.candidates, 1);
        assert_eq!(out.audit_log.len(), 1);
    }

    #[test]
    fn overflowing_quarantine_total_is_rejected() {
        let rows: Vec<CatalogRow> = Vec::new();
        let mut agg = Aggregator::new(&rows);
        agg.record(&resolution("x", i64::MAX, None, 0, MatchMethod::Unresolved)).unwrap();
        assert!(agg.record(&resolution("y", 1, None, 0, MatchMethod::Unresolved)).is_err());
    }

    #[test]
    fn overflowing_merge_is_rejected() {
        let rows = vec![CatalogRow::new("AB-123", "", 1), CatalogRow::new("CD-9", "", i64::MAX)];
        let err = apply_increments(&rows, &[3, 1]).unwrap_err();
        assert!(matches!(err, ReconError::MalformedInput { index: 1, .. }));
        assert!(err.to_string().contains("catalog"));
        assert_eq!(apply_increments(&rows, &[3, 0]).unwrap()[1].quantity, i64::MAX);
    }
}
