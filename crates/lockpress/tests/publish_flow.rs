//! End-to-end publish and read flows over a fully in-memory platform.

use lockpress::envelope::{Chapter, EncryptionEnvelope, PostLocale};
use lockpress::resolver::PostPolicy;
use lockpress::{PostDraft, PublishError, SealedPost};
use lockpress_testkit::TestPlatform;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn sample_locale() -> PostLocale {
    PostLocale {
        title: "Chapter Thirteen".into(),
        preview: "In which the plot thickens.".into(),
        tags: vec!["serial".into(), "fiction".into()],
        categories: vec!["novels".into()],
        chapters: vec![Chapter {
            title: "The Locked Door".into(),
            data: "bafy.../chapter-13.md".into(),
        }],
    }
}

fn gated(sealed: SealedPost) -> (lockpress::SealedLocale, EncryptionEnvelope) {
    match sealed {
        SealedPost::Gated { locale, encryption } => (locale, encryption),
        SealedPost::Public(_) => panic!("expected a gated post"),
    }
}

#[tokio::test]
async fn test_public_post_passes_through() {
    let platform = TestPlatform::new("press.example");
    let author = platform.publisher_for(&platform.wallet("0xauthor"));

    let draft = PostDraft {
        locale: sample_locale(),
        policy: PostPolicy::public(),
    };

    match author.seal_post(&draft).await.unwrap() {
        SealedPost::Public(locale) => assert_eq!(locale, sample_locale()),
        SealedPost::Gated { .. } => panic!("public post must not be gated"),
    }
}

#[tokio::test]
async fn test_gated_publish_and_read_roundtrip() {
    init_tracing();
    let platform = TestPlatform::new("press.example");
    let author_wallet = platform.wallet("0xAuthor");
    let sub_wallet = platform.wallet("0xSubscriber");

    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);

    // The subscriber published a reading key at some earlier point
    let subscriber = platform.publisher_for(&sub_wallet);
    subscriber.ensure_reading_key().await.unwrap();

    let author = platform.publisher_for(&author_wallet);
    let sealed = author
        .seal_post(&PostDraft {
            locale: sample_locale(),
            policy: PostPolicy::subscribers(1000),
        })
        .await
        .unwrap();
    let (sealed_locale, envelope) = gated(sealed);

    // The envelope survives persistence in the post descriptor
    let json = serde_json::to_string(&envelope).unwrap();
    let envelope: EncryptionEnvelope = serde_json::from_str(&json).unwrap();
    envelope.validate().unwrap();

    // Nothing readable in the stored form
    assert_ne!(sealed_locale.title, sample_locale().title);
    assert!(!json.contains("Chapter Thirteen"));

    // Subscriber and author both decrypt to the same plaintext
    let opened = subscriber.open_locale(&envelope, &sealed_locale).await.unwrap();
    assert_eq!(opened, sample_locale());

    let opened = author.open_locale(&envelope, &sealed_locale).await.unwrap();
    assert_eq!(opened, sample_locale());
}

#[tokio::test]
async fn test_non_recipient_cannot_open() {
    let platform = TestPlatform::new("press.example");
    let author_wallet = platform.wallet("0xauthor");
    let sub_wallet = platform.wallet("0xsub");
    let outsider_wallet = platform.wallet("0xoutsider");

    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);
    platform
        .publisher_for(&sub_wallet)
        .ensure_reading_key()
        .await
        .unwrap();

    let outsider = platform.publisher_for(&outsider_wallet);
    outsider.ensure_reading_key().await.unwrap();

    let author = platform.publisher_for(&author_wallet);
    let (_, envelope) = gated(
        author
            .seal_post(&PostDraft {
                locale: sample_locale(),
                policy: PostPolicy::subscribers(1000),
            })
            .await
            .unwrap(),
    );

    let err = outsider.open_envelope(&envelope).await.unwrap_err();
    assert!(matches!(err, PublishError::NotARecipient(_)));
}

#[tokio::test]
async fn test_read_without_vault_rederives_from_signature() {
    let platform = TestPlatform::new("press.example");
    let author_wallet = platform.wallet("0xauthor");
    let sub_wallet = platform.wallet("0xsub");

    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);
    platform
        .publisher_for(&sub_wallet)
        .ensure_reading_key()
        .await
        .unwrap();

    let author = platform.publisher_for(&author_wallet);
    let (sealed_locale, envelope) = gated(
        author
            .seal_post(&PostDraft {
                locale: sample_locale(),
                policy: PostPolicy::subscribers(1000),
            })
            .await
            .unwrap(),
    );

    // A fresh session with an empty vault: the reading key is reconstructed
    // from a new signature over the same message
    let fresh_session = platform.publisher_for(&sub_wallet);
    let opened = fresh_session
        .open_locale(&envelope, &sealed_locale)
        .await
        .unwrap();
    assert_eq!(opened, sample_locale());
}

#[tokio::test]
async fn test_comment_inherits_parent_recipients() {
    let platform = TestPlatform::new("press.example");
    let author_wallet = platform.wallet("0xauthor");
    let sub_wallet = platform.wallet("0xsub");
    let commenter_wallet = platform.wallet("0xcommenter");

    // The commenter has their own unrelated sponsor, which must not leak in
    let stranger_wallet = platform.wallet("0xstranger");
    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);
    platform.add_sponsor(&author_wallet.address, &commenter_wallet.address, 2000, 4);
    platform.add_sponsor(&commenter_wallet.address, &stranger_wallet.address, 9000, 9);

    for wallet in [&sub_wallet, &commenter_wallet, &stranger_wallet] {
        platform
            .publisher_for(wallet)
            .ensure_reading_key()
            .await
            .unwrap();
    }

    let author = platform.publisher_for(&author_wallet);
    let (_, parent) = gated(
        author
            .seal_post(&PostDraft {
                locale: sample_locale(),
                policy: PostPolicy::subscribers(1000),
            })
            .await
            .unwrap(),
    );

    let commenter = platform.publisher_for(&commenter_wallet);
    let comment_locale = PostLocale {
        title: "Re: Chapter Thirteen".into(),
        preview: "Called it.".into(),
        tags: vec![],
        categories: vec![],
        chapters: vec![],
    };
    let (sealed_comment, comment_envelope) = gated(
        commenter
            .seal_comment(&parent, &comment_locale)
            .await
            .unwrap(),
    );

    // Parent's recipients carry over; the stranger is not among them
    for address in parent.recipient_addresses() {
        assert!(comment_envelope.contains(&address), "missing {address}");
    }
    assert!(!comment_envelope.contains(&stranger_wallet.address));

    // A parent recipient reads the comment
    let subscriber = platform.publisher_for(&sub_wallet);
    let opened = subscriber
        .open_locale(&comment_envelope, &sealed_comment)
        .await
        .unwrap();
    assert_eq!(opened, comment_locale);

    // The comment has its own post key
    assert_ne!(
        parent.key_exchange_pub_key,
        comment_envelope.key_exchange_pub_key
    );
}

#[tokio::test]
async fn test_reseal_keeps_post_key_and_adds_new_subscriber() {
    let platform = TestPlatform::new("press.example");
    let author_wallet = platform.wallet("0xauthor");
    let early_wallet = platform.wallet("0xearly");

    platform.add_sponsor(&author_wallet.address, &early_wallet.address, 2000, 4);
    platform
        .publisher_for(&early_wallet)
        .ensure_reading_key()
        .await
        .unwrap();

    let author = platform.publisher_for(&author_wallet);
    let (_, envelope) = gated(
        author
            .seal_post(&PostDraft {
                locale: sample_locale(),
                policy: PostPolicy::subscribers(1000),
            })
            .await
            .unwrap(),
    );

    // A new subscriber arrives after the initial publish
    let late_wallet = platform.wallet("0xlate");
    platform.add_sponsor(&author_wallet.address, &late_wallet.address, 2000, 4);
    platform
        .publisher_for(&late_wallet)
        .ensure_reading_key()
        .await
        .unwrap();

    let edited = PostLocale {
        title: "Chapter Thirteen (revised)".into(),
        ..sample_locale()
    };
    let (sealed_locale, resealed) = gated(author.reseal(&envelope, &edited).await.unwrap());

    // Same post key, re-wrapped for the fresh recipient set
    assert_eq!(envelope.key_exchange_pub_key, resealed.key_exchange_pub_key);
    assert!(resealed.contains(&late_wallet.address));

    for wallet in [&early_wallet, &late_wallet] {
        let reader = platform.publisher_for(wallet);
        let opened = reader.open_locale(&resealed, &sealed_locale).await.unwrap();
        assert_eq!(opened, edited);
    }
}

#[tokio::test]
async fn test_moderators_receive_every_gated_post() {
    let mut platform = TestPlatform::new("press.example");
    let moderator_wallet = platform.wallet("0xBigBrother");
    platform.big_brothers = vec![moderator_wallet.address.clone()];

    let author_wallet = platform.wallet("0xauthor");
    let sub_wallet = platform.wallet("0xsub");
    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);

    platform
        .publisher_for(&sub_wallet)
        .ensure_reading_key()
        .await
        .unwrap();
    let moderator = platform.publisher_for(&moderator_wallet);
    moderator.ensure_reading_key().await.unwrap();

    let author = platform.publisher_for(&author_wallet);
    let (sealed_locale, envelope) = gated(
        author
            .seal_post(&PostDraft {
                locale: sample_locale(),
                policy: PostPolicy::subscribers(1000),
            })
            .await
            .unwrap(),
    );

    let opened = moderator.open_locale(&envelope, &sealed_locale).await.unwrap();
    assert_eq!(opened, sample_locale());
}

#[tokio::test]
async fn test_unkeyed_moderator_blocks_publish() {
    let mut platform = TestPlatform::new("press.example");
    let moderator_wallet = platform.wallet("0xbigbrother");
    platform.big_brothers = vec![moderator_wallet.address.clone()];

    let author_wallet = platform.wallet("0xauthor");
    let sub_wallet = platform.wallet("0xsub");
    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);
    platform
        .publisher_for(&sub_wallet)
        .ensure_reading_key()
        .await
        .unwrap();

    // The moderator never published a key
    let author = platform.publisher_for(&author_wallet);
    let err = author
        .seal_post(&PostDraft {
            locale: sample_locale(),
            policy: PostPolicy::subscribers(1000),
        })
        .await
        .unwrap_err();

    match err {
        PublishError::Resolve(lockpress::resolver::ResolveError::MissingModeratorKeys(
            offending,
        )) => {
            assert_eq!(offending, vec![moderator_wallet.address.clone()]);
        }
        other => panic!("expected MissingModeratorKeys, got {other:?}"),
    }
}

#[tokio::test]
async fn test_purchase_post_includes_processor() {
    let mut platform = TestPlatform::new("press.example");
    let processor_wallet = platform.wallet("0xprocessor");
    platform.processor_address = Some(processor_wallet.address.clone());

    let processor = platform.publisher_for(&processor_wallet);
    processor.ensure_reading_key().await.unwrap();

    // No sponsors at all: purchase access is the only fallback
    let author_wallet = platform.wallet("0xauthor");
    let author = platform.publisher_for(&author_wallet);
    let (sealed_locale, envelope) = gated(
        author
            .seal_post(&PostDraft {
                locale: sample_locale(),
                policy: PostPolicy::subscribers(1000).with_purchase(5000, "USD"),
            })
            .await
            .unwrap(),
    );

    assert!(envelope.allow_purchase);
    assert_eq!(envelope.purchase_price, Some(5000));
    assert_eq!(
        envelope.processor_address.as_deref(),
        Some(processor_wallet.address.as_str())
    );

    let opened = processor.open_locale(&envelope, &sealed_locale).await.unwrap();
    assert_eq!(opened, sample_locale());
}

#[tokio::test]
async fn test_tampered_envelope_stays_locked() {
    let platform = TestPlatform::new("press.example");
    let author_wallet = platform.wallet("0xauthor");
    let sub_wallet = platform.wallet("0xsub");

    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);
    let subscriber = platform.publisher_for(&sub_wallet);
    subscriber.ensure_reading_key().await.unwrap();

    let author = platform.publisher_for(&author_wallet);
    let (_, envelope) = gated(
        author
            .seal_post(&PostDraft {
                locale: sample_locale(),
                policy: PostPolicy::subscribers(1000),
            })
            .await
            .unwrap(),
    );

    // Flip one hex digit of the subscriber's wrapped key
    let mut tampered = envelope.clone();
    let key = sub_wallet.address.canonical();
    let entry = tampered.recipients.get_mut(&key).unwrap();
    let mut pass: Vec<u8> = entry.pass.clone().into_bytes();
    pass[0] = if pass[0] == b'0' { b'1' } else { b'0' };
    entry.pass = String::from_utf8(pass).unwrap();

    assert!(subscriber.open_envelope(&tampered).await.is_err());
}

#[tokio::test]
async fn test_refused_signature_surfaces_as_key_error() {
    let platform = TestPlatform::new("press.example");
    let author_wallet = platform.wallet("0xauthor");
    let sub_wallet = platform.wallet("0xsub");
    platform.add_sponsor(&author_wallet.address, &sub_wallet.address, 2000, 4);
    platform
        .publisher_for(&sub_wallet)
        .ensure_reading_key()
        .await
        .unwrap();

    author_wallet.refuse_signing();
    let author = platform.publisher_for(&author_wallet);

    let err = author
        .seal_post(&PostDraft {
            locale: sample_locale(),
            policy: PostPolicy::subscribers(1000),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PublishError::Key(_)));
}
