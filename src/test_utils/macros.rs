/// Asserts that a [`ConfirmationReceiver`](crate::ConfirmationReceiver) resolves to a successful
/// confirmation with the given block hash and transaction event.
///
/// The receiver is consumed by the assertion; it must not be awaited again afterwards.
///
/// # Panics
///
/// * **Timeout**: no confirmation within the timeout (default 5 seconds, configurable via
///   `timeout = N`).
/// * **Failure**: the receiver resolved to an error.
/// * **Mismatch**: the block hash or event differ from the expected ones.
#[macro_export]
macro_rules! assert_confirmed {
    ($receiver: expr, $block_hash: expr, $event: expr) => {
        $crate::assert_confirmed!($receiver, $block_hash, $event, timeout = 5)
    };
    ($receiver: expr, $block_hash: expr, $event: expr, timeout = $secs: expr) => {
        let confirmation =
            tokio::time::timeout(std::time::Duration::from_secs($secs), &mut $receiver)
                .await
                .expect("timed out waiting for confirmation");
        let expected_hash = $crate::BlockHash::from($block_hash);
        let expected_event = $event;
        match confirmation {
            std::result::Result::Ok(confirmed) => {
                assert_eq!(
                    confirmed.block_hash, expected_hash,
                    "Expected block hash {:?}, got {:?}",
                    expected_hash, confirmed.block_hash
                );
                assert_eq!(
                    confirmed.event, expected_event,
                    "Expected event {:?}, got {:?}",
                    expected_event, confirmed.event
                );
            }
            std::result::Result::Err(e) => {
                panic!("Expected confirmation of {:?}, got Err({:?})", expected_event, e);
            }
        }
    };
}

/// Asserts that a [`ConfirmationReceiver`](crate::ConfirmationReceiver) resolves to a failure of
/// the same kind as the expected [`ConfirmationError`](crate::ConfirmationError).
///
/// Only the error variant is compared, not its fields.
#[macro_export]
macro_rules! assert_failed {
    ($receiver: expr, $expected_err: expr) => {
        $crate::assert_failed!($receiver, $expected_err, timeout = 5)
    };
    ($receiver: expr, $expected_err: expr, timeout = $secs: expr) => {
        let confirmation =
            tokio::time::timeout(std::time::Duration::from_secs($secs), &mut $receiver)
                .await
                .expect("timed out waiting for confirmation");
        let expected = $expected_err;
        assert!(
            confirmation == expected,
            "Expected failure {:?}, got {:?}",
            expected,
            confirmation
        );
    };
}

/// Asserts that a [`ConfirmationReceiver`](crate::ConfirmationReceiver) stays unresolved for a
/// while (default 100 milliseconds, configurable via `millis = N`).
///
/// The receiver remains usable afterwards.
#[macro_export]
macro_rules! assert_pending {
    ($receiver: expr) => {
        $crate::assert_pending!($receiver, millis = 100)
    };
    ($receiver: expr, millis = $millis: expr) => {
        let outcome =
            tokio::time::timeout(std::time::Duration::from_millis($millis), &mut $receiver).await;
        if let std::result::Result::Ok(confirmation) = outcome {
            panic!("Expected no confirmation yet, got {:?}", confirmation);
        }
    };
}

/// Asserts that a tracker's latest block hash becomes `$block_hash` within the timeout
/// (default 5 seconds, configurable via `timeout = N`).
#[macro_export]
macro_rules! assert_block_hash {
    ($tracker: expr, $block_hash: expr) => {
        $crate::assert_block_hash!($tracker, $block_hash, timeout = 5)
    };
    ($tracker: expr, $block_hash: expr, timeout = $secs: expr) => {
        let expected = $crate::BlockHash::from($block_hash);
        let mut updates = $tracker.watch_block_hash();
        let observed = tokio::time::timeout(
            std::time::Duration::from_secs($secs),
            updates.wait_for(|hash| hash.as_ref() == std::option::Option::Some(&expected)),
        )
        .await
        .map(|result| result.is_ok());
        assert!(
            matches!(observed, std::result::Result::Ok(true)),
            "Expected latest block hash {:?}, got {:?}",
            expected,
            $tracker.latest_block_hash()
        );
    };
}
