//! Depth-sort worker for point-cloud rendering
//!
//! Sorting runs on its own thread. The render loop posts a request and
//! keeps drawing with the last ordering it received; `poll` picks up a
//! fresh permutation when one is ready. Requests queued behind a running
//! sort are collapsed to the newest one.

use std::thread::{self, JoinHandle};

use mimic_core::{MimicError, MimicResult, Vec3};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Row-major 4×4 view transform
pub type ViewMatrix = [[f32; 4]; 4];

pub const IDENTITY_VIEW: ViewMatrix = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

struct SortJob {
    id: u64,
    positions: Vec<Vec3>,
    view: ViewMatrix,
}

struct SortResult {
    id: u64,
    order: Vec<u32>,
}

/// View-space depth of a point (camera looks down -Z)
fn view_depth(p: &Vec3, view: &ViewMatrix) -> f32 {
    let row = &view[2];
    row[0] * p.x + row[1] * p.y + row[2] * p.z + row[3]
}

/// Point count as a u32 index bound
pub fn point_count(len: usize) -> MimicResult<u32> {
    u32::try_from(len).map_err(|_| MimicError::PointCloudTooLarge(len))
}

/// Indices ordered back to front
pub fn depth_order(positions: &[Vec3], view: &ViewMatrix) -> MimicResult<Vec<u32>> {
    let count = point_count(positions.len())?;
    let depths: Vec<f32> = positions.iter().map(|p| view_depth(p, view)).collect();
    let mut order: Vec<u32> = (0..count).collect();
    order.sort_by(|&a, &b| depths[a as usize].total_cmp(&depths[b as usize]));
    Ok(order)
}

/// Background sorter with a non-blocking request/poll interface
pub struct DepthSortWorker {
    requests: Option<UnboundedSender<SortJob>>,
    results: UnboundedReceiver<SortResult>,
    handle: Option<JoinHandle<()>>,
    next_id: u64,
    /// Latest permutation received
    order: Vec<u32>,
    /// Request id the current ordering answers (0 = none yet)
    order_id: u64,
}

impl DepthSortWorker {
    /// Spawn the worker thread
    pub fn spawn() -> MimicResult<Self> {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (res_tx, res_rx) = mpsc::unbounded_channel();

        let handle = thread::Builder::new()
            .name("mimic-depth-sort".to_string())
            .spawn(move || run_worker(req_rx, res_tx))
            .map_err(|e| MimicError::WorkerUnavailable(e.to_string()))?;

        tracing::debug!("depth-sort worker started");
        Ok(Self {
            requests: Some(req_tx),
            results: res_rx,
            handle: Some(handle),
            next_id: 0,
            order: Vec::new(),
            order_id: 0,
        })
    }

    /// Queue a sort; never blocks. Returns the request id.
    pub fn request(&mut self, positions: Vec<Vec3>, view: ViewMatrix) -> MimicResult<u64> {
        point_count(positions.len())?;
        let sender = self
            .requests
            .as_ref()
            .ok_or_else(|| MimicError::WorkerUnavailable("worker shut down".to_string()))?;

        self.next_id += 1;
        let job = SortJob { id: self.next_id, positions, view };
        sender.send(job).map_err(|_| {
            tracing::warn!(id = self.next_id, "depth-sort worker gone, request dropped");
            MimicError::WorkerUnavailable("worker thread exited".to_string())
        })?;
        Ok(self.next_id)
    }

    /// Take any finished results; returns true if the ordering changed
    pub fn poll(&mut self) -> bool {
        let mut updated = false;
        while let Ok(result) = self.results.try_recv() {
            if result.id > self.order_id {
                self.order = result.order;
                self.order_id = result.id;
                updated = true;
            }
        }
        updated
    }

    /// Ordering to draw with (empty until the first result)
    pub fn order(&self) -> &[u32] {
        &self.order
    }

    /// Id of the request the current ordering answers
    pub fn order_id(&self) -> u64 {
        self.order_id
    }

    /// Is a newer request still outstanding?
    pub fn pending(&self) -> bool {
        self.order_id < self.next_id
    }
}

impl Drop for DepthSortWorker {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.requests.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("depth-sort worker panicked");
            }
        }
    }
}

fn run_worker(mut requests: UnboundedReceiver<SortJob>, results: UnboundedSender<SortResult>) {
    while let Some(mut job) = requests.blocking_recv() {
        let mut skipped = 0u32;
        while let Ok(newer) = requests.try_recv() {
            job = newer;
            skipped += 1;
        }
        if skipped > 0 {
            tracing::trace!(skipped, id = job.id, "superseded depth-sort requests");
        }

        let order = match depth_order(&job.positions, &job.view) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(id = job.id, error = %e, "depth-sort request rejected");
                continue;
            }
        };
        if results.send(SortResult { id: job.id, order }).is_err() {
            break;
        }
    }
    tracing::debug!("depth-sort worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(worker: &mut DepthSortWorker, id: u64) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while worker.order_id() < id {
            worker.poll();
            assert!(Instant::now() < deadline, "worker did not answer");
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn test_depth_order_back_to_front() {
        let points = vec![
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, -3.0),
        ];
        assert_eq!(depth_order(&points, &IDENTITY_VIEW).unwrap(), vec![1, 2, 0]);
    }

    #[test]
    fn test_depth_order_uses_view() {
        // Camera translated 10 units back along +Z
        let mut view = IDENTITY_VIEW;
        view[2][3] = -10.0;
        let points = vec![Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -2.0)];
        assert_eq!(depth_order(&points, &view).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_point_count_bound() {
        assert_eq!(point_count(3).unwrap(), 3);
        assert_eq!(point_count(u32::MAX as usize).unwrap(), u32::MAX);
        #[cfg(target_pointer_width = "64")]
        {
            let too_many = u32::MAX as usize + 1;
            let err = point_count(too_many).unwrap_err();
            assert!(matches!(err, MimicError::PointCloudTooLarge(n) if n == too_many));
        }
    }

    #[test]
    fn test_previous_order_kept_until_result() {
        let mut worker = DepthSortWorker::spawn().unwrap();
        assert!(worker.order().is_empty());
        assert!(!worker.pending());

        let id = worker
            .request(vec![Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -2.0)], IDENTITY_VIEW)
            .unwrap();
        assert!(worker.pending());
        wait_for(&mut worker, id);
        assert_eq!(worker.order(), &[1, 0]);
        assert!(!worker.pending());
    }

    #[test]
    fn test_latest_request_wins() {
        let mut worker = DepthSortWorker::spawn().unwrap();
        let near_first = vec![Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, -2.0)];
        let far_first = vec![Vec3::new(0.0, 0.0, -2.0), Vec3::new(0.0, 0.0, -1.0)];

        for _ in 0..20 {
            worker.request(near_first.clone(), IDENTITY_VIEW).unwrap();
        }
        let last = worker.request(far_first, IDENTITY_VIEW).unwrap();
        wait_for(&mut worker, last);
        assert_eq!(worker.order(), &[0, 1]);
    }

    #[test]
    fn test_drop_joins_thread() {
        let mut worker = DepthSortWorker::spawn().unwrap();
        worker.request(vec![Vec3::new(0.0, 0.0, 0.0)], IDENTITY_VIEW).unwrap();
        drop(worker);
    }
}
