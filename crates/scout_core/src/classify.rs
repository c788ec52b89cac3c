use crate::{IndicatorSet, Language};

/// Case-insensitive keyword search of every language token in `text`.
///
/// An empty result means the text mentions none of the languages; callers
/// treat that as inconclusive rather than as a failure.
pub fn classify(text: &str) -> IndicatorSet {
    let lowered = text.to_lowercase();
    Language::ALL
        .into_iter()
        .filter(|language| lowered.contains(language.token()))
        .collect()
}
