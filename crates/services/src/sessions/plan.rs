use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Question, QuizConfig};

/// Endless stream of pool indices: shuffle the pool, drain it, reshuffle a fresh copy.
///
/// Every full pass yields each index exactly once, so `n` draws contain every
/// index at least `n / pool_len` times.
pub struct ResampleStream<'r, R: Rng + ?Sized> {
    pool_len: usize,
    bag: Vec<usize>,
    rng: &'r mut R,
}

impl<'r, R: Rng + ?Sized> ResampleStream<'r, R> {
    pub fn new(pool_len: usize, rng: &'r mut R) -> Self {
        Self {
            pool_len,
            bag: Vec::with_capacity(pool_len),
            rng,
        }
    }
}

impl<R: Rng + ?Sized> Iterator for ResampleStream<'_, R> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.pool_len == 0 {
            return None;
        }
        if self.bag.is_empty() {
            self.bag.extend(0..self.pool_len);
            self.bag.shuffle(&mut *self.rng);
        }
        self.bag.pop()
    }
}

/// Builds the working sequence of a session from the flattened pool.
pub struct SequenceBuilder<'a> {
    config: &'a QuizConfig,
}

impl<'a> SequenceBuilder<'a> {
    #[must_use]
    pub fn new(config: &'a QuizConfig) -> Self {
        Self { config }
    }

    /// Produce the questions a session will present, in order.
    ///
    /// - With a sample size, exactly that many draws from `ResampleStream`.
    /// - Otherwise the whole pool, shuffled when `shuffle_questions` is set.
    pub fn build<R: Rng + ?Sized>(self, pool: &[Question], rng: &mut R) -> Vec<Question> {
        if let Some(sample) = self.config.sample_size() {
            let take = usize::try_from(sample).unwrap_or(usize::MAX);
            return ResampleStream::new(pool.len(), rng)
                .take(take)
                .map(|index| pool[index].clone())
                .collect();
        }

        let mut sequence = pool.to_vec();
        if self.config.shuffle_questions() {
            sequence.shuffle(rng);
        }
        sequence
    }
}

/// Display order of one question's options.
///
/// `displayed[pos]` is the original index of the option shown at `pos`. The
/// question itself is never reordered, so scoring stays on original indices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionOrder {
    displayed: Vec<usize>,
}

impl OptionOrder {
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self {
            displayed: (0..len).collect(),
        }
    }

    /// Uniform random permutation of `len` options.
    pub fn shuffled<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Self {
        let mut order = Self::identity(len);
        order.displayed.shuffle(rng);
        order
    }

    /// Order for `question`, shuffled when the config asks for it.
    pub fn for_question<R: Rng + ?Sized>(
        question: &Question,
        config: &QuizConfig,
        rng: &mut R,
    ) -> Self {
        if config.shuffle_options() {
            Self::shuffled(question.option_count(), rng)
        } else {
            Self::identity(question.option_count())
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.displayed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.displayed.is_empty()
    }

    /// Original option index shown at display position `pos`.
    #[must_use]
    pub fn original_index(&self, pos: usize) -> Option<usize> {
        self.displayed.get(pos).copied()
    }

    /// Display position of the option with original index `original`.
    #[must_use]
    pub fn display_position(&self, original: usize) -> Option<usize> {
        self.displayed.iter().position(|&idx| idx == original)
    }

    /// Original indices in display order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.displayed.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RandomSource;
    use quiz_core::model::{QuestionId, QuizConfigDraft, Scoring};
    use std::collections::HashMap;

    fn question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            Scoring::Binary {
                correct: 0,
                explanation: String::new(),
            },
        )
        .unwrap()
    }

    fn pool(n: u64) -> Vec<Question> {
        (1..=n).map(question).collect()
    }

    #[test]
    fn sampling_fills_exact_length_and_covers_pool_evenly() {
        let config = QuizConfigDraft {
            sample_size: Some(23),
            ..QuizConfigDraft::default()
        }
        .validate()
        .unwrap();
        let pool = pool(5);
        let mut rng = RandomSource::seeded(11).rng();

        let sequence = SequenceBuilder::new(&config).build(&pool, &mut rng);
        assert_eq!(sequence.len(), 23);

        let mut counts: HashMap<QuestionId, usize> = HashMap::new();
        for q in &sequence {
            *counts.entry(q.id()).or_default() += 1;
        }
        assert_eq!(counts.len(), 5);
        assert!(counts.values().all(|&c| c >= 23 / 5));
    }

    #[test]
    fn sample_smaller_than_pool_has_no_repeats() {
        let config = QuizConfigDraft {
            sample_size: Some(3),
            ..QuizConfigDraft::default()
        }
        .validate()
        .unwrap();
        let pool = pool(10);
        let mut rng = RandomSource::seeded(3).rng();

        let sequence = SequenceBuilder::new(&config).build(&pool, &mut rng);
        let mut ids: Vec<_> = sequence.iter().map(Question::id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn unshuffled_sequence_keeps_pool_order() {
        let config = QuizConfig::default();
        let pool = pool(4);
        let mut rng = RandomSource::seeded(1).rng();
        let sequence = SequenceBuilder::new(&config).build(&pool, &mut rng);
        assert_eq!(sequence, pool);
    }

    #[test]
    fn shuffled_sequence_is_a_permutation() {
        let config = QuizConfigDraft {
            shuffle_questions: true,
            ..QuizConfigDraft::default()
        }
        .validate()
        .unwrap();
        let pool = pool(8);
        let mut rng = RandomSource::seeded(5).rng();
        let mut ids: Vec<_> = SequenceBuilder::new(&config)
            .build(&pool, &mut rng)
            .iter()
            .map(Question::id)
            .collect();
        ids.sort();
        assert_eq!(ids, pool.iter().map(Question::id).collect::<Vec<_>>());
    }

    #[test]
    fn resample_stream_of_empty_pool_ends() {
        let mut rng = RandomSource::seeded(0).rng();
        assert_eq!(ResampleStream::new(0, &mut rng).next(), None);
    }

    #[test]
    fn option_order_maps_both_ways() {
        let mut rng = RandomSource::seeded(42).rng();
        let order = OptionOrder::shuffled(5, &mut rng);
        assert_eq!(order.len(), 5);
        for pos in 0..5 {
            let original = order.original_index(pos).unwrap();
            assert_eq!(order.display_position(original), Some(pos));
        }
        assert_eq!(order.original_index(5), None);

        let mut seen: Vec<_> = order.iter().collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }
}
