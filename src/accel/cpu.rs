use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use rayon::prelude::*;

use crate::accel::backend::{Accelerator, AcceleratorSettings, CompositeJob};
use crate::foundation::error::{PlayoutError, PlayoutResult};
use crate::foundation::math::{mul_div255_u8, ycbcr_to_bgr};
use crate::frame::buffer::PixelBuffer;
use crate::frame::deferred::{Deferred, Promise, deferred};
use crate::frame::pixel_format::{PixelFormat, PixelFormatDesc};
use crate::mixer::blend::{PremulBgra8, composite_pixel};

struct Submission {
    job: CompositeJob,
    promise: Promise<PixelBuffer>,
}

/// CPU compositor running on its own worker thread.
///
/// Jobs are rendered FIFO. Each output row is processed in parallel on a rayon pool, so
/// the mixer executor is never blocked on pixel work. Dropping the accelerator finishes
/// queued jobs and joins the worker.
pub struct CpuAccelerator {
    tx: Option<Sender<Submission>>,
    worker: Option<JoinHandle<()>>,
    completed: Arc<AtomicU64>,
}

impl CpuAccelerator {
    /// Spawn the worker thread and its row pool.
    pub fn new(settings: AcceleratorSettings) -> PlayoutResult<Self> {
        let pool = build_thread_pool(settings.threads)?;
        let (tx, rx) = crossbeam_channel::unbounded::<Submission>();
        let completed = Arc::new(AtomicU64::new(0));
        let worker = {
            let completed = Arc::clone(&completed);
            std::thread::Builder::new()
                .name("accel-cpu".to_string())
                .spawn(move || run_worker(rx, pool, settings, completed))
                .map_err(|e| {
                    PlayoutError::configuration(format!("failed to spawn accelerator thread: {e}"))
                })?
        };
        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
            completed,
        })
    }

    /// Number of jobs resolved so far, successfully or not.
    pub fn completed_jobs(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}

impl Accelerator for CpuAccelerator {
    fn submit(&self, job: CompositeJob) -> Deferred<PixelBuffer> {
        let (promise, handle) = deferred();
        match &self.tx {
            // A failed send drops the promise, which fails the handle.
            Some(tx) => {
                if tx.send(Submission { job, promise }).is_err() {
                    tracing::error!("cpu accelerator worker is gone; composite dropped");
                }
            }
            None => promise.fail("cpu accelerator is shut down"),
        }
        handle
    }
}

impl Drop for CpuAccelerator {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("cpu accelerator worker panicked");
        }
    }
}

fn run_worker(
    rx: Receiver<Submission>,
    pool: rayon::ThreadPool,
    settings: AcceleratorSettings,
    completed: Arc<AtomicU64>,
) {
    tracing::debug!("cpu accelerator started");
    for Submission { job, promise } in rx.iter() {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| composite(&job, settings.clear_bgra))
        }))
        .unwrap_or_else(|_| Err(PlayoutError::composition("cpu composite panicked")));
        match outcome {
            Ok(pixels) => promise.set(pixels),
            Err(e) => {
                tracing::error!(error = %e, layers = job.layers.len(), "cpu composite failed");
                promise.fail(e.to_string());
            }
        }
        completed.fetch_add(1, Ordering::Release);
    }
    tracing::debug!("cpu accelerator stopped");
}

fn build_thread_pool(threads: Option<usize>) -> PlayoutResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PlayoutError::validation(
            "accelerator 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("accel-row-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PlayoutError::configuration(format!("failed to build rayon thread pool: {e}")))
}

/// Render one job into packed premultiplied BGRA.
pub(crate) fn composite(job: &CompositeJob, clear: Option<[u8; 4]>) -> PlayoutResult<PixelBuffer> {
    let (w, h) = (job.format.width as usize, job.format.height as usize);
    let desc = PixelFormatDesc::bgra(job.format.width, job.format.height);
    let mut out = match clear {
        Some(px) => px.repeat(w * h),
        None => vec![0u8; w * h * 4],
    };

    for layer in &job.layers {
        for image in &layer.images {
            let sampler = Sampler::new(&image.pixels)?;
            if sampler.width == 0 || sampler.height == 0 {
                continue;
            }
            let mode = layer.mode;
            let opacity = image.opacity;
            let dx = offset_px(image.translation[0], w);
            let dy = offset_px(image.translation[1], h);
            out.par_chunks_mut(w * 4).enumerate().for_each(|(y, row)| {
                let Some(ty) = translate(y, dy, h) else {
                    return;
                };
                let sy = ty * sampler.height / h;
                for (x, dst) in row.chunks_exact_mut(4).enumerate() {
                    let Some(tx) = translate(x, dx, w) else {
                        continue;
                    };
                    let sx = tx * sampler.width / w;
                    let src = sampler.sample(sx, sy);
                    let px = composite_pixel(mode, [dst[0], dst[1], dst[2], dst[3]], src, opacity);
                    dst.copy_from_slice(&px);
                }
            });
        }
    }

    PixelBuffer::from_planes(desc, vec![out])
}

fn offset_px(fraction: f64, len: usize) -> isize {
    let px = (fraction * len as f64).round();
    if px.is_finite() {
        px.clamp(-(len as f64), len as f64) as isize
    } else {
        0
    }
}

/// Image coordinate shown at output position `pos`, if the shifted image covers it.
fn translate(pos: usize, offset: isize, len: usize) -> Option<usize> {
    let p = pos as isize - offset;
    (p >= 0 && (p as usize) < len).then_some(p as usize)
}

enum Source<'a> {
    Packed {
        data: &'a [u8],
        linesize: usize,
        // Source byte offsets of B, G, R, A.
        order: [usize; 4],
    },
    Ycbcr {
        y: (&'a [u8], usize),
        cb: (&'a [u8], usize),
        cr: (&'a [u8], usize),
        alpha: Option<(&'a [u8], usize)>,
        chroma_w: usize,
        chroma_h: usize,
    },
}

/// Nearest-neighbour reader yielding premultiplied BGRA from any consumable layout.
struct Sampler<'a> {
    src: Source<'a>,
    width: usize,
    height: usize,
}

impl<'a> Sampler<'a> {
    fn new(buf: &'a PixelBuffer) -> PlayoutResult<Self> {
        buf.check_geometry()?;
        let desc = buf.desc();
        let (width, height) = buf.dimensions();
        let plane = |i: usize| -> PlayoutResult<(&'a [u8], usize)> {
            let linesize = desc
                .planes
                .get(i)
                .map(|p| p.linesize)
                .ok_or_else(|| PlayoutError::validation(format!("missing plane {i}")))?;
            Ok((buf.plane(i)?, linesize))
        };
        let src = match desc.format {
            PixelFormat::Bgra | PixelFormat::Rgba | PixelFormat::Argb | PixelFormat::Abgr => {
                let (data, linesize) = plane(0)?;
                let order = match desc.format {
                    PixelFormat::Bgra => [0, 1, 2, 3],
                    PixelFormat::Rgba => [2, 1, 0, 3],
                    PixelFormat::Argb => [3, 2, 1, 0],
                    _ => [1, 2, 3, 0],
                };
                Source::Packed {
                    data,
                    linesize,
                    order,
                }
            }
            PixelFormat::Ycbcr | PixelFormat::Ycbcra => {
                let chroma = desc
                    .planes
                    .get(1)
                    .ok_or_else(|| PlayoutError::validation("missing chroma plane"))?;
                Source::Ycbcr {
                    y: plane(0)?,
                    cb: plane(1)?,
                    cr: plane(2)?,
                    alpha: if desc.format == PixelFormat::Ycbcra {
                        Some(plane(3)?)
                    } else {
                        None
                    },
                    chroma_w: chroma.width,
                    chroma_h: chroma.height,
                }
            }
            PixelFormat::Invalid => {
                return Err(PlayoutError::composition(
                    "accelerator cannot sample an unconverted pixel format",
                ));
            }
        };
        Ok(Self { src, width, height })
    }

    fn sample(&self, x: usize, y: usize) -> PremulBgra8 {
        match &self.src {
            Source::Packed {
                data,
                linesize,
                order,
            } => {
                let i = y * linesize + x * 4;
                [
                    data[i + order[0]],
                    data[i + order[1]],
                    data[i + order[2]],
                    data[i + order[3]],
                ]
            }
            Source::Ycbcr {
                y: (yd, yl),
                cb: (cbd, cbl),
                cr: (crd, crl),
                alpha,
                chroma_w,
                chroma_h,
            } => {
                let cx = x * chroma_w / self.width;
                let cy = y * chroma_h / self.height;
                let [b, g, r] = ycbcr_to_bgr(yd[y * yl + x], cbd[cy * cbl + cx], crd[cy * crl + cx]);
                let a = alpha.as_ref().map_or(255, |(ad, al)| ad[y * al + x]);
                let a16 = u16::from(a);
                [
                    mul_div255_u8(u16::from(b), a16),
                    mul_div255_u8(u16::from(g), a16),
                    mul_div255_u8(u16::from(r), a16),
                    a,
                ]
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/accel/cpu.rs"]
mod tests;
