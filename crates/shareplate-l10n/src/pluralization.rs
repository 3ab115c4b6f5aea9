//! Plural and ordinal category selection per locale
//!
//! Category selection is a pure function of `(count, locale)`. The
//! resolved translation key is `base_key.category`, with `base_key.other`
//! as the fallback when the category-specific key is absent (handled by
//! the coordinator).

use crate::locale::LocaleCode;

/// CLDR-style plural categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    /// The key suffix for this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Select the cardinal plural category for a count in the given locale
pub fn plural_category(locale: LocaleCode, count: i64) -> PluralCategory {
    let n = count.unsigned_abs();
    match locale {
        LocaleCode::English | LocaleCode::German => {
            if n == 1 {
                PluralCategory::One
            } else {
                PluralCategory::Other
            }
        }
        // Spanish, French and Portuguese treat 0 and 1 as singular in
        // colloquial UI copy
        LocaleCode::Spanish | LocaleCode::French | LocaleCode::Portuguese => {
            if n <= 1 {
                PluralCategory::One
            } else {
                PluralCategory::Other
            }
        }
        LocaleCode::Russian => slavic_category(n, false),
        LocaleCode::Polish => slavic_category(n, true),
        LocaleCode::Arabic => arabic_category(n),
    }
}

/// Select the ordinal category (1st, 2nd, 3rd, ...) for a count
pub fn ordinal_category(locale: LocaleCode, count: i64) -> PluralCategory {
    let n = count.unsigned_abs();
    match locale {
        LocaleCode::English => match (n % 10, n % 100) {
            (1, c) if c != 11 => PluralCategory::One,
            (2, c) if c != 12 => PluralCategory::Two,
            (3, c) if c != 13 => PluralCategory::Few,
            _ => PluralCategory::Other,
        },
        _ => PluralCategory::Other,
    }
}

/// Shared Slavic rule: `few` when mod10 in 2..=4 and mod100 not in
/// 12..=14. Polish restricts `one` to exactly 1; Russian also uses it
/// for 21, 31, ... (mod10 == 1, mod100 != 11).
fn slavic_category(n: u64, one_is_exactly_one: bool) -> PluralCategory {
    let mod10 = n % 10;
    let mod100 = n % 100;
    let is_one = if one_is_exactly_one {
        n == 1
    } else {
        mod10 == 1 && mod100 != 11
    };
    if is_one {
        PluralCategory::One
    } else if (2..=4).contains(&mod10) && !(12..=14).contains(&mod100) {
        PluralCategory::Few
    } else {
        PluralCategory::Many
    }
}

fn arabic_category(n: u64) -> PluralCategory {
    match n {
        0 => PluralCategory::Zero,
        1 => PluralCategory::One,
        2 => PluralCategory::Two,
        _ => {
            let mod100 = n % 100;
            if (3..=10).contains(&mod100) {
                PluralCategory::Few
            } else if (11..=99).contains(&mod100) {
                PluralCategory::Many
            } else {
                PluralCategory::Other
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_cardinal() {
        assert_eq!(plural_category(LocaleCode::English, 1), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::English, 0), PluralCategory::Other);
        assert_eq!(plural_category(LocaleCode::English, 5), PluralCategory::Other);
    }

    #[test]
    fn test_romance_zero_is_singular() {
        assert_eq!(plural_category(LocaleCode::French, 0), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::Spanish, 1), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::Spanish, 2), PluralCategory::Other);
    }

    #[test]
    fn test_polish_few_rule() {
        assert_eq!(plural_category(LocaleCode::Polish, 1), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::Polish, 2), PluralCategory::Few);
        assert_eq!(plural_category(LocaleCode::Polish, 4), PluralCategory::Few);
        assert_eq!(plural_category(LocaleCode::Polish, 5), PluralCategory::Many);
        // mod100 in 12..=14 blocks the few rule
        assert_eq!(plural_category(LocaleCode::Polish, 12), PluralCategory::Many);
        assert_eq!(plural_category(LocaleCode::Polish, 22), PluralCategory::Few);
        // one is exactly one: 21 is not singular in Polish
        assert_eq!(plural_category(LocaleCode::Polish, 21), PluralCategory::Many);
    }

    #[test]
    fn test_russian_teen_rule() {
        assert_eq!(plural_category(LocaleCode::Russian, 1), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::Russian, 21), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::Russian, 11), PluralCategory::Many);
        assert_eq!(plural_category(LocaleCode::Russian, 3), PluralCategory::Few);
        assert_eq!(plural_category(LocaleCode::Russian, 113), PluralCategory::Many);
    }

    #[test]
    fn test_arabic_full_range() {
        assert_eq!(plural_category(LocaleCode::Arabic, 0), PluralCategory::Zero);
        assert_eq!(plural_category(LocaleCode::Arabic, 1), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::Arabic, 2), PluralCategory::Two);
        assert_eq!(plural_category(LocaleCode::Arabic, 7), PluralCategory::Few);
        assert_eq!(plural_category(LocaleCode::Arabic, 15), PluralCategory::Many);
        assert_eq!(plural_category(LocaleCode::Arabic, 100), PluralCategory::Other);
    }

    #[test]
    fn test_english_ordinal() {
        assert_eq!(ordinal_category(LocaleCode::English, 1), PluralCategory::One);
        assert_eq!(ordinal_category(LocaleCode::English, 2), PluralCategory::Two);
        assert_eq!(ordinal_category(LocaleCode::English, 3), PluralCategory::Few);
        assert_eq!(ordinal_category(LocaleCode::English, 4), PluralCategory::Other);
        assert_eq!(ordinal_category(LocaleCode::English, 11), PluralCategory::Other);
        assert_eq!(ordinal_category(LocaleCode::English, 21), PluralCategory::One);
    }

    #[test]
    fn test_negative_counts_use_absolute_value() {
        assert_eq!(plural_category(LocaleCode::English, -1), PluralCategory::One);
        assert_eq!(plural_category(LocaleCode::Polish, -2), PluralCategory::Few);
    }
}
