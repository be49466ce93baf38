//! The copy → verify → delete sequence for one object.

use std::sync::Arc;

use cm_store::ObjectStore;
use cm_types::{ObjectMeta, TransferFlags, TransferOutcome};
use tracing::{debug, warn};

use crate::retry::{with_retry, RetryPolicy};

/// Transfer one object from the source bucket to the destination bucket.
///
/// Steps run strictly in order, each store call wrapped in the retry
/// executor:
/// 1. Re-check the source object exists. An object deleted between listing
///    and processing is an expected race and yields
///    [`TransferOutcome::SkippedMissing`].
/// 2. Copy to the destination under the identical name.
/// 3. Verify by fetching destination metadata. A missing destination after a
///    reported-successful copy is a hard failure of this object.
/// 4. Delete the source, only when `delete_source` was requested AND the
///    copy verified. Deletion is never attempted on an unverified copy.
///
/// Any step error yields [`TransferOutcome::Failed`] carrying the flags
/// accumulated so far. One object's failure never affects another's.
pub async fn transfer_object(
    store: &Arc<dyn ObjectStore>,
    source_bucket: &str,
    object: &ObjectMeta,
    destination_bucket: &str,
    delete_source: bool,
    retry: &RetryPolicy,
) -> TransferOutcome {
    let name = object.name.as_str();
    let mut flags = TransferFlags::default();

    // 1. Existence re-check
    match with_retry(retry, "get_metadata", name, || {
        let store = store.clone();
        let bucket = source_bucket.to_string();
        let name = name.to_string();
        async move { store.get_metadata(&bucket, &name).await }
    })
    .await
    {
        Ok(Some(_)) => {}
        Ok(None) => {
            debug!(object = name, "Skipping: no longer exists at time of processing");
            return TransferOutcome::SkippedMissing;
        }
        Err(e) => {
            warn!(object = name, error = %e, "Source metadata fetch failed");
            return TransferOutcome::Failed {
                flags,
                reason: format!("source metadata fetch failed: {}", e),
            };
        }
    }

    // 2. Copy
    if let Err(e) = with_retry(retry, "copy_object", name, || {
        let store = store.clone();
        let src = source_bucket.to_string();
        let dst = destination_bucket.to_string();
        let name = name.to_string();
        async move { store.copy_object(&src, &name, &dst).await }
    })
    .await
    {
        warn!(object = name, error = %e, "Copy failed");
        return TransferOutcome::Failed {
            flags,
            reason: format!("copy failed: {}", e),
        };
    }
    flags.copied = true;

    // 3. Verify
    match with_retry(retry, "get_metadata", name, || {
        let store = store.clone();
        let bucket = destination_bucket.to_string();
        let name = name.to_string();
        async move { store.get_metadata(&bucket, &name).await }
    })
    .await
    {
        Ok(Some(_)) => flags.verified = true,
        Ok(None) => {
            warn!(object = name, "Destination object not found after copy");
            return TransferOutcome::Failed {
                flags,
                reason: format!("destination object {} not found after copy", name),
            };
        }
        Err(e) => {
            warn!(object = name, error = %e, "Verification fetch failed");
            return TransferOutcome::Failed {
                flags,
                reason: format!("verification fetch failed: {}", e),
            };
        }
    }

    // 4. Delete, only on a verified copy
    if delete_source && flags.verified {
        match with_retry(retry, "delete_object", name, || {
            let store = store.clone();
            let bucket = source_bucket.to_string();
            let name = name.to_string();
            async move { store.delete_object(&bucket, &name).await }
        })
        .await
        {
            Ok(()) => flags.deleted = true,
            Err(e) => {
                warn!(object = name, error = %e, "Source delete failed");
                return TransferOutcome::Failed {
                    flags,
                    reason: format!("source delete failed: {}", e),
                };
            }
        }
    }

    debug!(
        object = name,
        copied = flags.copied,
        verified = flags.verified,
        deleted = flags.deleted,
        "Transfer complete"
    );

    TransferOutcome::Completed(flags)
}
