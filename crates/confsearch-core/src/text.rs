//! Conference-to-text serialization used as embedding input.
//!
//! Every embedding backend goes through [`TextBudget::embedding_input`], so the
//! fallback order (full form, then short form, then hard cut) and the budget
//! arithmetic exist exactly once.

use crate::types::Conference;

/// Full representation, including description and attending companies.
pub fn full_text(c: &Conference) -> String {
    format!(
        "name: {}\nlocation: {}\ndescription: {}\ncountry: {}\nindustries: {}, {}, {},\nattendingCompanies: {}\n",
        c.name,
        c.formatted_location,
        c.description,
        c.country_description,
        c.industry_codes,
        c.industry_sectors,
        c.industry_groups,
        c.attendee_names,
    )
}

/// Short representation: drops the low-priority free-text fields.
pub fn short_text(c: &Conference) -> String {
    format!(
        "name: {}\nlocation: {}\ncountry: {}\nindustries: {}, {}, {}\n",
        c.name,
        c.formatted_location,
        c.country_description,
        c.industry_codes,
        c.industry_sectors,
        c.industry_groups,
    )
}

/// Character budget derived from a token budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextBudget {
    pub max_tokens: usize,
    pub chars_per_token: usize,
}

impl Default for TextBudget {
    fn default() -> Self {
        Self { max_tokens: 400, chars_per_token: 4 }
    }
}

impl TextBudget {
    pub fn new(max_tokens: usize, chars_per_token: usize) -> Self {
        Self { max_tokens, chars_per_token }
    }

    pub fn max_chars(&self) -> usize {
        self.max_tokens.saturating_mul(self.chars_per_token)
    }

    /// A text is over budget when it has strictly more characters than `max_chars`.
    pub fn fits(&self, text: &str) -> bool {
        text.chars().count() <= self.max_chars()
    }

    /// Cuts `text` to exactly `max_chars` characters (never splits a code point).
    pub fn hard_cut(&self, text: &str) -> String {
        match text.char_indices().nth(self.max_chars()) {
            Some((byte_idx, _)) => text[..byte_idx].to_string(),
            None => text.to_string(),
        }
    }

    /// Embedding input for `c`: full form if it fits, else short form if it
    /// fits, else the short form cut to the budget.
    pub fn embedding_input(&self, c: &Conference) -> String {
        let full = full_text(c);
        if self.fits(&full) {
            return full;
        }
        let short = short_text(c);
        if self.fits(&short) {
            return short;
        }
        self.hard_cut(&short)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conference() -> Conference {
        Conference {
            id: "c1".into(),
            name: "Money20/20".into(),
            formatted_location: "Amsterdam".into(),
            description: "Payments and fintech".into(),
            country_description: "Netherlands".into(),
            industry_codes: "6199".into(),
            industry_sectors: "Financials".into(),
            industry_groups: "Diversified Financials".into(),
            attendee_names: "Adyen, Stripe".into(),
            ..Default::default()
        }
    }

    #[test]
    fn full_form_when_within_budget() {
        let c = conference();
        let input = TextBudget::default().embedding_input(&c);
        assert_eq!(input, full_text(&c));
        assert!(input.contains("description: Payments and fintech"));
        assert!(input.contains("attendingCompanies: Adyen, Stripe"));
    }

    #[test]
    fn short_form_when_full_form_over_budget() {
        let mut c = conference();
        c.description = "x".repeat(2_000);
        let budget = TextBudget::default();
        let input = budget.embedding_input(&c);
        assert_eq!(input, short_text(&c));
        assert!(!input.contains("description"));
        assert!(!input.contains("attendingCompanies"));
    }

    #[test]
    fn hard_cut_to_exact_budget_when_short_form_over_budget() {
        let mut c = conference();
        c.description = "x".repeat(2_000);
        c.name = "n".repeat(100);
        let budget = TextBudget::new(10, 4);
        let input = budget.embedding_input(&c);
        assert_eq!(input.chars().count(), 40);
        assert_eq!(input, short_text(&c).chars().take(40).collect::<String>());
        assert_eq!(input, budget.embedding_input(&c));
    }

    #[test]
    fn exactly_at_budget_is_not_truncated() {
        let budget = TextBudget::new(2, 2);
        assert!(budget.fits("abcd"));
        assert!(!budget.fits("abcde"));
        assert_eq!(budget.hard_cut("abcd"), "abcd");
        assert_eq!(budget.hard_cut("abcde"), "abcd");
    }

    #[test]
    fn hard_cut_respects_multibyte_characters() {
        let budget = TextBudget::new(1, 3);
        assert_eq!(budget.hard_cut("zürich"), "zür");
    }
}
