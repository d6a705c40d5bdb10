use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use expiring_link::{
    CheckError, Clock, ExpiringLink, LinkConfig, ManualClock, TokenFormat, format_message,
    format_token, parse, sign_rounds,
};

const SECRETS: &[&str] = &[
    "meow",
    "a reasonably but not insanely long string",
    "UTF-8 stuff: 😁🚧🚀",
];

fn epoch() -> DateTime<Utc> {
    "2021-09-29T12:45:26.371Z".parse().unwrap()
}

fn manual_link(
    config: LinkConfig,
    now: DateTime<Utc>,
) -> (ExpiringLink<Arc<ManualClock>>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(now));
    (ExpiringLink::with_clock(config, Arc::clone(&clock)), clock)
}

/// Replace the character at `idx` with a different hex digit.
fn flip_char(token: &str, idx: usize) -> String {
    let mut chars: Vec<char> = token.chars().collect();
    chars[idx] = if chars[idx] == '0' { '1' } else { '0' };
    chars.into_iter().collect()
}

#[test]
fn test_roundtrip_system_clock() {
    let link = ExpiringLink::new(
        LinkConfig::new(epoch())
            .with_expire(Duration::from_secs(24 * 60 * 60))
            .with_rounds(5),
    );
    for secret in SECRETS {
        let token = link.generate(secret);
        assert_eq!(link.check(&token, secret), Ok(()), "{secret:?} -> {token}");
    }
}

#[test]
fn test_secret_sensitivity() {
    let link = ExpiringLink::new(LinkConfig::new(epoch()).with_rounds(5));
    for secret in SECRETS {
        let token = link.generate(secret);
        assert_eq!(
            link.check(&token, "UnusedSecretValue"),
            Err(CheckError::InvalidHash)
        );
    }
}

#[test]
fn test_expire_with_real_clock() {
    let link = ExpiringLink::new(
        LinkConfig::new(epoch())
            .with_expire(Duration::from_secs(2))
            .with_rounds(5),
    );
    let tokens: Vec<String> = SECRETS.iter().map(|s| link.generate(s)).collect();
    for (token, secret) in tokens.iter().zip(SECRETS) {
        assert_eq!(link.check(token, secret), Ok(()), "expired too soon");
    }

    // Age is truncated to whole seconds, so allow an extra second of margin.
    thread::sleep(Duration::from_secs(3));

    for (token, secret) in tokens.iter().zip(SECRETS) {
        assert_eq!(
            link.check(token, secret),
            Err(CheckError::HashExpired),
            "didn't expire"
        );
    }
}

#[test]
fn test_expiry_monotonic() {
    let config = LinkConfig::new(epoch()).with_expire(Duration::from_secs(2));
    let (link, clock) = manual_link(config, epoch() + TimeDelta::days(3));
    let token = link.generate("meow");
    let expires_at = link.expires_at(&token).unwrap();

    for _ in 0..4 {
        assert!(clock.now() <= expires_at);
        assert_eq!(link.check(&token, "meow"), Ok(()));
        clock.advance(Duration::from_millis(500));
    }

    clock.advance(Duration::from_secs(1));
    for _ in 0..3 {
        assert_eq!(link.check(&token, "meow"), Err(CheckError::HashExpired));
        clock.advance(Duration::from_secs(3600));
    }
}

#[test]
fn test_tamper_every_signature_char() {
    for format in [TokenFormat::Rounds, TokenFormat::Plain] {
        let (link, _) = manual_link(
            LinkConfig::new(epoch()).with_format(format).with_rounds(3),
            epoch() + TimeDelta::days(1),
        );
        let token = link.generate("meow");
        let sig_start = token.rfind('g').unwrap() + 1;

        for idx in sig_start..token.len() {
            let tampered = flip_char(&token, idx);
            assert_eq!(
                link.check(&tampered, "meow"),
                Err(CheckError::InvalidHash),
                "{format:?} tampered at {idx}"
            );
        }
    }
}

#[test]
fn test_tamper_age_and_rounds() {
    let (link, _) = manual_link(
        LinkConfig::new(epoch()).with_rounds(3),
        epoch() + TimeDelta::days(1),
    );
    let token = link.generate("meow");
    let parsed = parse(&token, TokenFormat::Rounds).unwrap();

    // Extend the expiry but keep the old signature.
    let extended = format_token(parsed.age + 3600, parsed.rounds, parsed.signature);
    assert_eq!(link.check(&extended, "meow"), Err(CheckError::InvalidHash));

    // Lower the claimed cost but keep the old signature.
    let cheaper = format_token(parsed.age, Some(1), parsed.signature);
    assert_eq!(link.check(&cheaper, "meow"), Err(CheckError::InvalidHash));
}

#[test]
fn test_corrupt_structural_input() {
    let link = ExpiringLink::new(LinkConfig::new(epoch()));
    for token in ["ff", "", "g", "gg", "xyzg8gabc", "ffgzzgabc", "ffg8gabcg1", "ffg8"] {
        assert_eq!(
            link.check(token, "meow"),
            Err(CheckError::CorruptHash),
            "{token:?}"
        );
    }

    let plain = ExpiringLink::new(LinkConfig::new(epoch()).with_format(TokenFormat::Plain));
    for token in ["ff", "", "zzgabc", "ffg8gabc"] {
        assert_eq!(
            plain.check(token, "meow"),
            Err(CheckError::CorruptHash),
            "{token:?}"
        );
    }
}

#[test]
fn test_round_count_ceiling() {
    let now = epoch() + TimeDelta::days(1);
    let (verifier, _) = manual_link(
        LinkConfig::new(epoch()).with_rounds(4).with_max_rounds(4),
        now,
    );

    // Forge a correctly signed token that claims five rounds.
    let age = (now - epoch()).num_seconds() as u64 + 60;
    let message = format_message(age, Some(5));
    let token = format_token(age, Some(5), &sign_rounds(&message, b"meow", 5));
    assert_eq!(verifier.check(&token, "meow"), Err(CheckError::CorruptHash));

    // The same token verifies once the ceiling is lifted.
    verifier.set_max_rounds(0);
    assert_eq!(verifier.check(&token, "meow"), Ok(()));
}

#[test]
fn test_cost_determinism() {
    let now = epoch() + TimeDelta::hours(7);
    let config = LinkConfig::new(epoch()).with_rounds(16);
    let (a, _) = manual_link(config.clone(), now);
    let (b, _) = manual_link(config, now);

    for secret in SECRETS {
        assert_eq!(a.generate(secret), a.generate(secret));
        assert_eq!(a.generate(secret), b.generate(secret));
    }
}

#[test]
fn test_changing_epoch_revives_expired_tokens() {
    let config = LinkConfig::new(epoch()).with_expire(Duration::from_secs(60));
    let (link, clock) = manual_link(config.clone(), epoch() + TimeDelta::days(10));
    let token = link.generate("meow");

    clock.advance(Duration::from_secs(3600));
    assert_eq!(link.check(&token, "meow"), Err(CheckError::HashExpired));

    // Same secret, epoch shifted by a day: the expired token is live again.
    let mut shifted = config.clone();
    shifted.epoch = epoch() + TimeDelta::days(1);
    let (relocated, _) = manual_link(shifted, clock.now());
    assert_eq!(relocated.check(&token, "meow"), Ok(()));

    // Shifting the other way expires tokens that should still be valid.
    let fresh = link.generate("meow");
    let mut shifted = config;
    shifted.epoch = epoch() - TimeDelta::days(1);
    let (relocated, _) = manual_link(shifted, clock.now());
    assert_eq!(link.check(&fresh, "meow"), Ok(()));
    assert_eq!(relocated.check(&fresh, "meow"), Err(CheckError::HashExpired));
}

#[test]
fn test_concurrent_generate_check_and_update() {
    let link = Arc::new(ExpiringLink::new(
        LinkConfig::new(epoch()).with_rounds(2).with_max_rounds(64),
    ));

    thread::scope(|scope| {
        for worker in 0..4 {
            let link = Arc::clone(&link);
            scope.spawn(move || {
                for i in 0..50 {
                    let secret = format!("worker-{worker}-{i}");
                    let token = link.generate(&secret);
                    assert_eq!(link.check(&token, &secret), Ok(()));
                }
            });
        }

        let link = Arc::clone(&link);
        scope.spawn(move || {
            for rounds in 1..=32 {
                link.set_rounds(rounds);
            }
        });
    });

    assert_eq!(link.settings().rounds, 32);
}
