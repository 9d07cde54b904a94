//! Turns a requested session mode plus the contributor's current progress
//! into an ordered list of work items.

use crate::dataset::ContributorProgress;
use crate::models::{Category, SessionMode, WorkItem};
use crate::settings::{CollectorSettings, Targets};

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRequest {
    Single(Category),
    Balanced,
    Validation,
    Debug,
}

impl SessionRequest {
    pub fn mode(&self) -> SessionMode {
        match self {
            SessionRequest::Single(_) => SessionMode::Single,
            SessionRequest::Balanced => SessionMode::Balanced,
            SessionRequest::Validation => SessionMode::Validation,
            SessionRequest::Debug => SessionMode::Debug,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub mode: SessionMode,
    pub items: Vec<WorkItem>,
    /// Minimum score a frame needs to be persisted in this session.
    pub quality_threshold: u8,
}

impl SessionPlan {
    /// Nothing left to collect for this request.
    pub fn is_complete(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_target(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.target)).sum()
    }
}

pub fn plan_session(
    request: SessionRequest,
    progress: &ContributorProgress,
    settings: &CollectorSettings,
) -> SessionPlan {
    let targets = &settings.targets;
    let items = match request {
        SessionRequest::Single(category) => vec![WorkItem::new(category, targets.single)],
        SessionRequest::Balanced => balanced_items(progress, targets),
        SessionRequest::Validation => Category::ALL
            .iter()
            .map(|category| WorkItem::new(*category, targets.validation))
            .collect(),
        SessionRequest::Debug => vec![WorkItem::new(settings.debug_category, targets.debug)],
    };

    let quality_threshold = match request {
        SessionRequest::Debug => settings.debug_quality_threshold,
        _ => settings.quality_threshold,
    };

    SessionPlan {
        mode: request.mode(),
        items,
        quality_threshold,
    }
}

/// Per-category shortfall for the contributor, canonical order, zeros kept.
pub fn deficits(progress: &ContributorProgress, per_category: u32) -> Vec<(Category, u32)> {
    Category::ALL
        .iter()
        .map(|category| {
            let have = progress.count_for(*category);
            let need = u64::from(per_category).saturating_sub(have);
            // need <= per_category, so it fits.
            (*category, need as u32)
        })
        .collect()
}

/// Categories the contributor still owes, largest deficit first. Equal
/// deficits keep canonical category order (stable sort). Empty once the
/// contributor has met their overall target.
pub fn balanced_items(progress: &ContributorProgress, targets: &Targets) -> Vec<WorkItem> {
    if progress.contributor_total >= u64::from(targets.per_contributor) {
        return Vec::new();
    }

    let mut needed: Vec<WorkItem> = deficits(progress, targets.per_category)
        .into_iter()
        .filter(|(_, need)| *need > 0)
        .map(|(category, need)| WorkItem::new(category, need))
        .collect();
    needed.sort_by(|a, b| b.target.cmp(&a.target));
    needed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{CategoryCount, StoreStatus};

    fn progress_with(counts: &[(Category, u64)]) -> ContributorProgress {
        let categories: Vec<CategoryCount> = Category::ALL
            .iter()
            .map(|category| {
                let n = counts
                    .iter()
                    .find(|(c, _)| c == category)
                    .map(|(_, n)| *n)
                    .unwrap_or(0);
                CategoryCount {
                    category: *category,
                    contributor_count: n,
                    project_total: n,
                    status: StoreStatus::Readable,
                }
            })
            .collect();
        ContributorProgress {
            contributor: "alice".into(),
            contributor_total: categories.iter().map(|c| c.contributor_count).sum(),
            project_total: categories.iter().map(|c| c.project_total).sum(),
            categories,
            diagnostics: Vec::new(),
        }
    }

    fn all_at(n: u64) -> Vec<(Category, u64)> {
        Category::ALL.iter().map(|c| (*c, n)).collect()
    }

    #[test]
    fn balanced_orders_by_largest_deficit_and_drops_complete() {
        // Deficits: A = Good_Posture 10, B = Slouching 0, C = Forward_Head 250.
        let mut counts = all_at(500);
        counts[0].1 = 490;
        counts[2].1 = 250;
        let progress = progress_with(&counts);

        let items = balanced_items(&progress, &Targets::default());
        assert_eq!(
            items,
            vec![
                WorkItem::new(Category::ForwardHead, 250),
                WorkItem::new(Category::GoodPosture, 10),
            ]
        );
    }

    #[test]
    fn balanced_ties_keep_canonical_order() {
        let progress = progress_with(&[]);
        let items = balanced_items(&progress, &Targets::default());

        let order: Vec<Category> = items.iter().map(|i| i.category).collect();
        assert_eq!(order, Category::ALL.to_vec());
        assert!(items.iter().all(|i| i.target == 500));
    }

    #[test]
    fn balanced_is_empty_once_contributor_target_met() {
        let mut counts = all_at(0);
        counts[0].1 = 5000;
        let progress = progress_with(&counts);

        assert!(balanced_items(&progress, &Targets::default()).is_empty());
    }

    #[test]
    fn balanced_is_empty_when_every_category_complete() {
        let targets = Targets {
            per_contributor: 10_000,
            ..Targets::default()
        };
        let progress = progress_with(&all_at(600));
        assert!(balanced_items(&progress, &targets).is_empty());
    }

    #[test]
    fn over_collected_category_has_zero_deficit() {
        let progress = progress_with(&[(Category::HeadDown, 900)]);
        let deficits = deficits(&progress, 500);
        assert_eq!(deficits[Category::HeadDown.index()], (Category::HeadDown, 0));
    }

    #[test]
    fn validation_covers_every_category_in_order() {
        let settings = CollectorSettings::default();
        let plan = plan_session(SessionRequest::Validation, &progress_with(&[]), &settings);

        assert_eq!(plan.mode, SessionMode::Validation);
        assert_eq!(plan.items.len(), Category::COUNT);
        for (item, category) in plan.items.iter().zip(Category::ALL) {
            assert_eq!(item.category, category);
            assert_eq!(item.target, 20);
        }
        assert_eq!(plan.quality_threshold, 50);
    }

    #[test]
    fn validation_ignores_progress() {
        let settings = CollectorSettings::default();
        let plan = plan_session(
            SessionRequest::Validation,
            &progress_with(&all_at(500)),
            &settings,
        );
        assert_eq!(plan.total_target(), 200);
    }

    #[test]
    fn single_uses_selected_category() {
        let settings = CollectorSettings::default();
        let plan = plan_session(
            SessionRequest::Single(Category::NervousExpression),
            &progress_with(&[]),
            &settings,
        );
        assert_eq!(plan.items, vec![WorkItem::new(Category::NervousExpression, 100)]);
        assert_eq!(plan.mode, SessionMode::Single);
    }

    #[test]
    fn debug_is_one_item_with_relaxed_threshold() {
        let settings = CollectorSettings::default();
        let plan = plan_session(SessionRequest::Debug, &progress_with(&[]), &settings);

        assert_eq!(plan.items, vec![WorkItem::new(Category::GoodPosture, 50)]);
        assert_eq!(plan.quality_threshold, 25);
        assert!(plan.quality_threshold < settings.quality_threshold);
    }

    #[test]
    fn complete_balanced_plan_is_not_an_error() {
        let settings = CollectorSettings::default();
        let plan = plan_session(
            SessionRequest::Balanced,
            &progress_with(&all_at(500)),
            &settings,
        );
        assert!(plan.is_complete());
        assert_eq!(plan.mode, SessionMode::Balanced);
    }
}
