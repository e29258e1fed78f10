#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tokio::sync::{mpsc, oneshot};

use pictura_core::compress::{CompressError, Compressor, SourceFile};

/// RGBA image whose pixel at (x, y) is `[x, y, 0, 255]` (values wrap at 256).
pub fn coordinate_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]));
    DynamicImage::ImageRgba8(img)
}

/// Deterministic noisy RGB image (LCG), hard to compress losslessly.
pub fn noisy_image(width: u32, height: u32) -> DynamicImage {
    let mut state: u32 = 0x1234_5678;
    let img = image::RgbImage::from_fn(width, height, |_, _| {
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        };
        image::Rgb([next(), next(), next()])
    });
    DynamicImage::ImageRgb8(img)
}

pub fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).expect("encode test image");
    buf.into_inner()
}

/// A source file of `size` bytes, all equal to `tag`. Mock compressors key on the tag.
pub fn tagged_file(name: &str, tag: u8, size: usize) -> SourceFile {
    SourceFile::new(name, vec![tag; size])
}

fn tag_of(source: &[u8]) -> u8 {
    source.first().copied().unwrap_or(0)
}

/// Planned result of a mock compress call.
#[derive(Clone, Debug)]
pub enum Script {
    /// Succeed with this many output bytes.
    Output(usize),
    /// Fail with this message.
    Fail(&'static str),
}

/// Compressor that answers immediately according to a per-tag script.
pub struct ScriptedCompressor {
    scripts: HashMap<u8, Script>,
    calls: AtomicUsize,
}

impl ScriptedCompressor {
    pub fn new(scripts: impl IntoIterator<Item = (u8, Script)>) -> Self {
        Self {
            scripts: scripts.into_iter().collect(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Compressor for ScriptedCompressor {
    async fn compress(&self, source: Arc<[u8]>) -> Result<Vec<u8>, CompressError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let tag = tag_of(&source);
        match self.scripts.get(&tag) {
            Some(Script::Output(len)) => Ok(vec![tag; *len]),
            Some(Script::Fail(message)) => Err(CompressError::new(*message)),
            None => Err(CompressError::new("no script")),
        }
    }
}

/// Compressor whose calls block until the test resolves them.
pub struct GatedCompressor {
    started: mpsc::UnboundedSender<u8>,
    pending: Mutex<HashMap<u8, oneshot::Receiver<Script>>>,
}

/// Test side of a [`GatedCompressor`].
pub struct Gates {
    pub started: mpsc::UnboundedReceiver<u8>,
    senders: HashMap<u8, oneshot::Sender<Script>>,
}

impl Gates {
    pub fn resolve(&mut self, tag: u8, script: Script) {
        let tx = self.senders.remove(&tag).expect("gate exists");
        let _ = tx.send(script);
    }

    /// Wait until `n` compress calls have started.
    pub async fn wait_started(&mut self, n: usize) -> Vec<u8> {
        let mut tags = Vec::with_capacity(n);
        for _ in 0..n {
            tags.push(self.started.recv().await.expect("compressor alive"));
        }
        tags
    }
}

impl GatedCompressor {
    pub fn new(tags: &[u8]) -> (Self, Gates) {
        let (started_tx, started_rx) = mpsc::unbounded_channel();
        let mut receivers = HashMap::new();
        let mut senders = HashMap::new();
        for &tag in tags {
            let (tx, rx) = oneshot::channel();
            senders.insert(tag, tx);
            receivers.insert(tag, rx);
        }
        (
            Self {
                started: started_tx,
                pending: Mutex::new(receivers),
            },
            Gates {
                started: started_rx,
                senders,
            },
        )
    }
}

#[async_trait]
impl Compressor for GatedCompressor {
    async fn compress(&self, source: Arc<[u8]>) -> Result<Vec<u8>, CompressError> {
        let tag = tag_of(&source);
        let rx = self.pending.lock().unwrap().remove(&tag);
        let _ = self.started.send(tag);
        let Some(rx) = rx else {
            return Err(CompressError::new("no gate"));
        };
        match rx.await {
            Ok(Script::Output(len)) => Ok(vec![tag; len]),
            Ok(Script::Fail(message)) => Err(CompressError::new(message)),
            Err(_) => Err(CompressError::new("gate dropped")),
        }
    }
}
