//! Locale encryption: the text fields a gated post hides.
//!
//! Title, preview, tags, categories, and chapter titles are encrypted; list
//! fields are JSON-encoded first so each becomes a single encrypted string.
//! Structural fields (chapter data paths) pass through untouched — the
//! uploaded content behind them is gated separately.

use serde::{Deserialize, Serialize};

use lockpress_core::{decrypt_field, encrypt_field, SecretBoxKey, X25519SecretKey};

use crate::error::Result;

/// One chapter of a post: a display title plus the path of its content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub title: String,
    /// Content path; structural, never encrypted here.
    pub data: String,
}

/// Plaintext locale fields of a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostLocale {
    pub title: String,
    pub preview: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// A chapter with its title encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedChapter {
    /// `<nonce-hex>:<ciphertext-hex>` of the title.
    pub title: String,
    pub data: String,
}

/// The encrypted form of [`PostLocale`].
///
/// Every field is a `<nonce-hex>:<ciphertext-hex>` string; tags and
/// categories hold the encryption of their JSON encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedLocale {
    pub title: String,
    pub preview: String,
    pub tags: String,
    pub categories: String,
    #[serde(default)]
    pub chapters: Vec<SealedChapter>,
}

/// Encrypt a locale under the post secret key.
pub fn encrypt_locale(locale: &PostLocale, post_secret: &X25519SecretKey) -> Result<SealedLocale> {
    let key = SecretBoxKey::from(post_secret);

    let chapters = locale
        .chapters
        .iter()
        .map(|chapter| {
            Ok(SealedChapter {
                title: encrypt_field(&chapter.title, &key)?,
                data: chapter.data.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SealedLocale {
        title: encrypt_field(&locale.title, &key)?,
        preview: encrypt_field(&locale.preview, &key)?,
        tags: encrypt_field(&serde_json::to_string(&locale.tags)?, &key)?,
        categories: encrypt_field(&serde_json::to_string(&locale.categories)?, &key)?,
        chapters,
    })
}

/// Decrypt a sealed locale with the post secret key.
///
/// Any tag mismatch fails the whole locale; fields are never partially
/// rendered.
pub fn decrypt_locale(sealed: &SealedLocale, post_secret: &X25519SecretKey) -> Result<PostLocale> {
    let key = SecretBoxKey::from(post_secret);

    let chapters = sealed
        .chapters
        .iter()
        .map(|chapter| {
            Ok(Chapter {
                title: decrypt_field(&chapter.title, &key)?,
                data: chapter.data.clone(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(PostLocale {
        title: decrypt_field(&sealed.title, &key)?,
        preview: decrypt_field(&sealed.preview, &key)?,
        tags: serde_json::from_str(&decrypt_field(&sealed.tags, &key)?)?,
        categories: serde_json::from_str(&decrypt_field(&sealed.categories, &key)?)?,
        chapters,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample_locale() -> PostLocale {
        PostLocale {
            title: "The Hidden Chapter".into(),
            preview: "A preview only subscribers may read in full.".into(),
            tags: vec!["fiction".into(), "serial".into()],
            categories: vec!["novels".into()],
            chapters: vec![
                Chapter {
                    title: "Part One".into(),
                    data: "bafy.../part-1.md".into(),
                },
                Chapter {
                    title: "Part Two".into(),
                    data: "bafy.../part-2.md".into(),
                },
            ],
        }
    }

    #[test]
    fn test_locale_roundtrip() {
        let secret = X25519SecretKey::generate();
        let locale = sample_locale();

        let sealed = encrypt_locale(&locale, &secret).unwrap();
        let opened = decrypt_locale(&sealed, &secret).unwrap();

        assert_eq!(opened, locale);
    }

    #[test]
    fn test_sealed_fields_are_field_format() {
        let secret = X25519SecretKey::generate();
        let sealed = encrypt_locale(&sample_locale(), &secret).unwrap();

        for field in [&sealed.title, &sealed.preview, &sealed.tags, &sealed.categories] {
            let (nonce_hex, _) = field.split_once(':').expect("field format");
            assert_eq!(nonce_hex.len(), 48);
        }
    }

    #[test]
    fn test_data_paths_untouched() {
        let secret = X25519SecretKey::generate();
        let locale = sample_locale();

        let sealed = encrypt_locale(&locale, &secret).unwrap();

        assert_eq!(sealed.chapters[0].data, locale.chapters[0].data);
        assert_eq!(sealed.chapters[1].data, locale.chapters[1].data);
        assert_ne!(sealed.chapters[0].title, locale.chapters[0].title);
    }

    #[test]
    fn test_wrong_key_locks_locale() {
        let secret = X25519SecretKey::generate();
        let other = X25519SecretKey::generate();

        let sealed = encrypt_locale(&sample_locale(), &secret).unwrap();
        assert!(decrypt_locale(&sealed, &other).is_err());
    }

    #[test]
    fn test_empty_lists_roundtrip() {
        let secret = X25519SecretKey::generate();
        let locale = PostLocale {
            title: "t".into(),
            preview: String::new(),
            tags: vec![],
            categories: vec![],
            chapters: vec![],
        };

        let opened = decrypt_locale(&encrypt_locale(&locale, &secret).unwrap(), &secret).unwrap();
        assert_eq!(opened, locale);
    }

    proptest! {
        #[test]
        fn locale_roundtrip_any_text(
            title in ".{0,80}",
            preview in ".{0,200}",
            tags in proptest::collection::vec(".{1,16}", 0..6),
        ) {
            let secret = X25519SecretKey::from_bytes([0x2a; 32]);
            let locale = PostLocale {
                title,
                preview,
                tags,
                categories: vec![],
                chapters: vec![],
            };

            let sealed = encrypt_locale(&locale, &secret).unwrap();
            prop_assert_eq!(decrypt_locale(&sealed, &secret).unwrap(), locale);
        }
    }
}
