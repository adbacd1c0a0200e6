//! Proptest strategies for property-based testing.

use proptest::prelude::*;

use lockpress_core::Address;
use lockpress_envelope::{Chapter, PostLocale};

/// Strategy for plausible wallet addresses.
pub fn address_strategy() -> impl Strategy<Value = Address> {
    "0x[0-9a-fA-F]{8,40}".prop_map(|s| Address::new(s).expect("generated address"))
}

/// Strategy for post locales with arbitrary text fields.
pub fn locale_strategy() -> impl Strategy<Value = PostLocale> {
    (
        ".{0,60}",
        ".{0,160}",
        proptest::collection::vec("[a-z]{1,12}", 0..5),
        proptest::collection::vec("[a-z]{1,12}", 0..3),
        proptest::collection::vec((".{0,40}", "[a-z0-9/.-]{1,40}"), 0..4),
    )
        .prop_map(|(title, preview, tags, categories, chapters)| PostLocale {
            title,
            preview,
            tags,
            categories,
            chapters: chapters
                .into_iter()
                .map(|(title, data)| Chapter { title, data })
                .collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_addresses_are_valid(address in address_strategy()) {
            prop_assert!(!address.as_str().is_empty());
            prop_assert!(address.matches(&address.canonical()));
        }

        #[test]
        fn generated_locales_roundtrip_encryption(locale in locale_strategy()) {
            let secret = lockpress_core::X25519SecretKey::from_bytes([0x2a; 32]);
            let sealed = lockpress_envelope::encrypt_locale(&locale, &secret).unwrap();
            let opened = lockpress_envelope::decrypt_locale(&sealed, &secret).unwrap();
            prop_assert_eq!(opened, locale);
        }
    }
}
