use std::fmt;

use tracing::debug;

use crate::config::ClassifierConfig;
use crate::descriptor::GestureDescriptor;
use crate::templates::TemplateLibrary;

pub const UNKNOWN: &str = "Unknown";

/// Classifier output. A miss is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Known(String),
    Unknown,
}

impl Label {
    pub fn as_str(&self) -> &str {
        match self {
            Label::Known(name) => name,
            Label::Unknown => UNKNOWN,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Label::Known(_))
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closest template and its error score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub error: f32,
}

/// Nearest-neighbour classifier with a rejection threshold.
///
/// Only the cells of the descriptor spanned by `node_subset` are compared.
#[derive(Debug, Clone)]
pub struct GestureClassifier {
    node_subset: Vec<usize>,
    tolerance: f32,
}

impl GestureClassifier {
    pub fn new(node_subset: Vec<usize>, tolerance: f32) -> Self {
        Self {
            node_subset,
            tolerance,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(config.node_subset.clone(), config.tolerance)
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn node_subset(&self) -> &[usize] {
        &self.node_subset
    }

    /// Template with the lowest error. Ties go to the earliest template.
    pub fn best_match(&self, live: &GestureDescriptor, templates: &TemplateLibrary) -> Option<Match> {
        let mut best: Option<Match> = None;
        for (index, template) in templates.iter().enumerate() {
            let error = template.descriptor.error_against(live, &self.node_subset);
            match best {
                Some(b) if !(error < b.error) => {}
                _ => best = Some(Match { index, error }),
            }
        }
        best
    }

    pub fn classify(&self, live: &GestureDescriptor, templates: &TemplateLibrary) -> Label {
        let Some(best) = self.best_match(live, templates) else {
            return Label::Unknown;
        };

        if best.error < self.tolerance {
            match templates.name_of(best.index) {
                Some(name) => {
                    debug!("Matched {} (error {:.2})", name, best.error);
                    Label::Known(name.to_string())
                }
                None => Label::Unknown,
            }
        } else {
            debug!(
                "Closest template {} rejected (error {:.2} >= {:.2})",
                best.index, best.error, self.tolerance
            );
            Label::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{sample_fist, sample_hand};
    use crate::types::Point2;

    const SUBSET: [usize; 10] = [0, 4, 5, 9, 13, 17, 8, 12, 16, 20];

    fn library() -> TemplateLibrary {
        TemplateLibrary::from_samples(
            vec![
                ("Five".to_string(), sample_hand(3, 400, 500)),
                ("Fist".to_string(), sample_fist(3, 400, 500)),
            ],
            21,
        )
        .unwrap()
    }

    #[test]
    fn own_descriptor_classifies_as_itself() {
        let lib = library();
        let clf = GestureClassifier::new(SUBSET.to_vec(), 10.0);
        for t in lib.iter() {
            assert_eq!(clf.classify(&t.descriptor, &lib), Label::Known(t.name.clone()));
        }
    }

    #[test]
    fn scaled_and_shifted_hand_matches() {
        let lib = library();
        let clf = GestureClassifier::new(SUBSET.to_vec(), 10.0);
        let live = GestureDescriptor::build(&sample_fist(5, 900, 200)).unwrap();
        assert_eq!(clf.classify(&live, &lib).as_str(), "Fist");
    }

    #[test]
    fn empty_library_is_unknown() {
        let clf = GestureClassifier::new(SUBSET.to_vec(), 10.0);
        let live = GestureDescriptor::build(&sample_hand(1, 0, 0)).unwrap();
        assert_eq!(clf.classify(&live, &TemplateLibrary::empty()), Label::Unknown);
        assert!(clf.best_match(&live, &TemplateLibrary::empty()).is_none());
    }

    #[test]
    fn error_at_tolerance_is_rejected() {
        let lib = library();
        let live = GestureDescriptor::build(&sample_fist(3, 400, 500)).unwrap();
        let five_error = lib.get(0).unwrap().descriptor.error_against(&live, &SUBSET);
        assert!(five_error > 0.0);

        let only_five = TemplateLibrary::from_samples(
            vec![("Five".to_string(), sample_hand(3, 400, 500))],
            21,
        )
        .unwrap();
        let strict = GestureClassifier::new(SUBSET.to_vec(), five_error);
        assert_eq!(strict.classify(&live, &only_five), Label::Unknown);

        let loose = GestureClassifier::new(SUBSET.to_vec(), five_error + 0.01);
        assert_eq!(loose.classify(&live, &only_five).as_str(), "Five");
    }

    #[test]
    fn ties_go_to_first_template() {
        let lib = TemplateLibrary::from_samples(
            vec![
                ("First".to_string(), sample_hand(2, 0, 0)),
                ("Second".to_string(), sample_hand(4, 100, 100)),
            ],
            21,
        )
        .unwrap();
        let clf = GestureClassifier::new(vec![0, 9], 1.0);
        let live = GestureDescriptor::build(&sample_hand(1, 0, 0)).unwrap();
        let best = clf.best_match(&live, &lib).unwrap();
        assert_eq!(best.index, 0);
        assert_eq!(clf.classify(&live, &lib).as_str(), "First");
    }

    #[test]
    fn differences_outside_subset_are_ignored() {
        let lib = library();
        let clf = GestureClassifier::new(SUBSET.to_vec(), 0.5);
        let mut hand = sample_hand(3, 400, 500);
        hand.points[6] = Point2::new(0, 0);
        let live = GestureDescriptor::build(&hand).unwrap();
        assert_eq!(clf.classify(&live, &lib).as_str(), "Five");
    }

    #[test]
    fn label_display() {
        assert_eq!(Label::Unknown.to_string(), "Unknown");
        assert_eq!(Label::Known("Rock".into()).to_string(), "Rock");
        assert!(!Label::Unknown.is_known());
    }
}
