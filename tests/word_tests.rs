use wordrace::{Alphabet, ValidationError, Word, WordList};

#[test]
fn test_parse_normalizes_case_and_whitespace() {
    let word = Word::parse("  water\n", &Alphabet::ENGLISH).unwrap();
    assert_eq!(word.to_string(), "WATER");
}

#[test]
fn test_parse_rejects_wrong_length() {
    assert_eq!(
        Word::parse("cat", &Alphabet::ENGLISH),
        Err(ValidationError::WrongLength(3))
    );
    assert_eq!(
        Word::parse("waters", &Alphabet::ENGLISH),
        Err(ValidationError::WrongLength(6))
    );
    assert_eq!(
        Word::parse("", &Alphabet::ENGLISH),
        Err(ValidationError::WrongLength(0))
    );
}

#[test]
fn test_parse_rejects_non_letters() {
    assert_eq!(
        Word::parse("w4ter", &Alphabet::ENGLISH),
        Err(ValidationError::NonAlphabetic('4'))
    );
    assert_eq!(
        Word::parse("wa-er", &Alphabet::ENGLISH),
        Err(ValidationError::NonAlphabetic('-'))
    );
}

#[test]
fn test_extended_alphabet_accepts_locale_letters() {
    const TURKISH_EXTRAS: &[char] = &['Ç', 'Ğ', 'İ', 'Ö', 'Ş', 'Ü'];
    let alphabet = Alphabet::with_extra(TURKISH_EXTRAS);
    assert!(Word::parse("KÖŞKÜ", &alphabet).is_ok());
    assert!(Word::parse("KÖŞKÜ", &Alphabet::ENGLISH).is_err());
}

#[test]
fn test_wordlist_membership_is_case_insensitive() {
    let list = WordList::builtin();
    assert!(list.is_valid("water"));
    assert!(list.is_valid("WATER"));
    assert!(list.is_valid("WaTeR"));
    assert!(!list.is_valid("zzzzz"));
}

#[test]
fn test_wordlist_rejects_malformed_without_panicking() {
    let list = WordList::builtin();
    assert!(!list.is_valid(""));
    assert!(!list.is_valid("hi"));
    assert!(!list.is_valid("w4ter"));
    assert!(!list.is_valid("six-letter"));
}

#[test]
fn test_check_reports_reason() {
    let list = WordList::builtin();
    assert_eq!(list.check("zzzzz"), Err(ValidationError::NotInWordList));
    assert_eq!(list.check("hi"), Err(ValidationError::WrongLength(2)));
}

#[test]
fn test_builtin_list_skips_nothing_it_needs() {
    let list = WordList::builtin();
    assert!(list.len() > 500);
    for probe in ["water", "house", "level", "allow", "llama", "eerie"] {
        assert!(list.is_valid(probe), "expected builtin word: {}", probe);
    }
}
