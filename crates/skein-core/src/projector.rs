//! # Bipartite to Unipartite Projection
//!
//! Walks every document of a bipartite store and emits a co-occurrence edge
//! into a unipartite store for each ordered pair of the document's linked
//! entities. A document with a single linked entity contributes that entity
//! as a standalone vertex. Entities in the skip set never reach the
//! projection.
//!
//! One generator thread feeds document ids onto a bounded job channel;
//! `num_workers` consumers drain it. Edge upserts are idempotent and the
//! projection is commutative, so any scheduling and any worker count yield
//! an equal unipartite store. The first error wins: it is parked in a shared
//! slot, the cancellation flag fans out, and every other participant exits
//! within one iteration.

use crate::bipartite::BipartiteStore;
use crate::types::{DocumentId, EntityIdSet, SkeinError};
use crate::unipartite::UnipartiteStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Unit of work handed from the generator to the workers.
#[derive(Debug)]
struct ProjectionJob {
    document_id: DocumentId,
    index: usize,
    total: usize,
}

/// Park `error` in the shared slot (first error wins) and cancel the pool.
fn record_error(slot: &Mutex<Option<SkeinError>>, cancelled: &AtomicBool, error: SkeinError) {
    let mut guard = slot.lock();
    if guard.is_none() {
        *guard = Some(error);
    }
    cancelled.store(true, Ordering::SeqCst);
}

/// Project one document into the unipartite store.
fn project_document<B, U>(
    bipartite: &B,
    unipartite: &U,
    skip_entities: &EntityIdSet,
    job: &ProjectionJob,
) -> Result<(), SkeinError>
where
    B: BipartiteStore + ?Sized,
    U: UnipartiteStore + ?Sized,
{
    tracing::trace!(
        document = %job.document_id,
        index = job.index,
        total = job.total,
        "projecting document"
    );

    let document = bipartite.document(&job.document_id)?;
    let linked = &document.linked_entities;

    // A sole linked entity has no pair to co-occur with; it still becomes a
    // vertex of the projection.
    if linked.len() == 1 {
        if let Some(only) = linked.iter().next() {
            if !skip_entities.contains(only) {
                unipartite.add_entity(only)?;
            }
        }
        return Ok(());
    }

    for first in linked {
        if skip_entities.contains(first) {
            continue;
        }
        for second in linked {
            if first == second || skip_entities.contains(second) {
                continue;
            }
            unipartite.add_undirected(first, second)?;
        }
    }
    Ok(())
}

/// Derive the unipartite co-occurrence projection of `bipartite` into
/// `unipartite`.
///
/// `num_workers` and `job_channel_size` must both be at least 1. On success
/// `finalise` is called on the unipartite store; on error the first failure
/// is returned and no partial result is promised.
pub fn bipartite_to_unipartite<B, U>(
    bipartite: &B,
    unipartite: &U,
    skip_entities: &EntityIdSet,
    num_workers: usize,
    job_channel_size: usize,
) -> Result<(), SkeinError>
where
    B: BipartiteStore + Sync + ?Sized,
    U: UnipartiteStore + Sync + ?Sized,
{
    if num_workers < 1 {
        return Err(SkeinError::InvalidNumberOfWorkers(num_workers));
    }
    if job_channel_size < 1 {
        return Err(SkeinError::InvalidJobChannelSize(job_channel_size));
    }

    let document_ids = bipartite.document_ids()?;
    let total = document_ids.len();
    tracing::debug!(
        documents = total,
        workers = num_workers,
        channel = job_channel_size,
        "projecting bipartite store"
    );

    let cancelled = AtomicBool::new(false);
    let first_error: Mutex<Option<SkeinError>> = Mutex::new(None);

    let (sender, receiver) = crossbeam_channel::bounded::<ProjectionJob>(job_channel_size);

    let cancelled_ref = &cancelled;
    let error_ref = &first_error;

    std::thread::scope(|scope| {
        for _ in 0..num_workers {
            let receiver = receiver.clone();
            scope.spawn(move || {
                loop {
                    if cancelled_ref.load(Ordering::SeqCst) {
                        break;
                    }
                    // The channel closes once the generator drops the sender.
                    let Ok(job) = receiver.recv() else {
                        break;
                    };
                    if let Err(error) =
                        project_document(bipartite, unipartite, skip_entities, &job)
                    {
                        record_error(error_ref, cancelled_ref, error);
                        break;
                    }
                }
            });
        }
        // Only the worker clones may keep the channel open; holding the
        // original receiver here would stall a blocked send forever.
        drop(receiver);

        scope.spawn(move || {
            for (index, document_id) in document_ids.into_iter().enumerate() {
                if cancelled_ref.load(Ordering::SeqCst) {
                    break;
                }
                let job = ProjectionJob {
                    document_id,
                    index,
                    total,
                };
                // A send error means every worker has exited.
                if sender.send(job).is_err() {
                    break;
                }
            }
        });
    });

    if let Some(error) = first_error.into_inner() {
        return Err(error);
    }

    unipartite.finalise()?;
    tracing::debug!(documents = total, "projection complete");
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
