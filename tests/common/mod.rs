#![allow(dead_code)]

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};

use tvg_playback::{
    AnimId, Engine, EngineHandle, ErrorCategory, RenderTarget, Runtime, RuntimeOpts, TvgError,
    TvgResult,
};

/// One engine call, as observed by [`ScriptedEngine`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Init(u32),
    Terminate,
    Create,
    Destroy(u32),
    SetFrame(u32, f32),
    Resize(u32, f32, f32),
    Bind(u32, usize),
    Draw(u32),
}

#[derive(Debug, Default)]
pub struct Log {
    pub calls: Vec<Call>,
}

impl Log {
    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    pub fn draws(&self) -> usize {
        self.count(|c| matches!(c, Call::Draw(_)))
    }

    pub fn set_frames(&self) -> Vec<f32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::SetFrame(_, f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    pub fn bound_addrs(&self) -> Vec<usize> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Bind(_, addr) => Some(*addr),
                _ => None,
            })
            .collect()
    }
}

/// Engine double with scripted metadata that records every call.
pub struct ScriptedEngine {
    pub log: Arc<Mutex<Log>>,
    pub natural: (f32, f32),
    pub duration: f32,
    pub total_frames: f32,
    pub fill: u32,
    pub fail_create: bool,
    pub fail_size: bool,
    pub fail_draw: bool,
    /// Fail the bind with this 1-based index.
    pub fail_bind_at: Option<usize>,
    /// Inside `create_animation`: signal the first channel, then wait on the second.
    pub create_gate: Option<(Sender<()>, Receiver<()>)>,
    binds: usize,
    next: u32,
    targets: Vec<(u32, RenderTarget)>,
}

impl ScriptedEngine {
    pub fn animated(total_frames: f32, duration: f32) -> Self {
        Self {
            log: Arc::default(),
            natural: (100.0, 100.0),
            duration,
            total_frames,
            fill: u32::from_le_bytes([10, 20, 30, 255]),
            fail_create: false,
            fail_size: false,
            fail_draw: false,
            fail_bind_at: None,
            create_gate: None,
            binds: 0,
            next: 0,
            targets: Vec::new(),
        }
    }

    pub fn still() -> Self {
        Self::animated(0.0, 0.0)
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().calls.push(call);
    }
}

impl Engine for ScriptedEngine {
    type Handle = AnimId;

    fn name(&self) -> &'static str {
        "scripted"
    }

    fn init(&mut self, threads: u32) -> TvgResult<()> {
        self.record(Call::Init(threads));
        Ok(())
    }

    fn terminate(&mut self) -> TvgResult<()> {
        self.record(Call::Terminate);
        Ok(())
    }

    fn create_animation(&mut self, _payload: &[u8]) -> TvgResult<AnimId> {
        if self.fail_create {
            return Err(TvgError::engine("Picture Load", ErrorCategory::Unsupported));
        }
        if let Some((entered, release)) = &self.create_gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        self.next += 1;
        self.record(Call::Create);
        Ok(AnimId(self.next))
    }

    fn destroy_animation(&mut self, handle: AnimId) -> TvgResult<()> {
        if handle.is_null() {
            return Ok(());
        }
        self.targets.retain(|(id, _)| *id != handle.0);
        self.record(Call::Destroy(handle.0));
        Ok(())
    }

    fn size(&self, _handle: AnimId) -> TvgResult<(f32, f32)> {
        if self.fail_size {
            return Err(TvgError::engine(
                "Picture Get Size",
                ErrorCategory::PreconditionNotMet,
            ));
        }
        Ok(self.natural)
    }

    fn duration(&self, _handle: AnimId) -> TvgResult<f32> {
        Ok(self.duration)
    }

    fn total_frames(&self, _handle: AnimId) -> TvgResult<f32> {
        Ok(self.total_frames)
    }

    fn set_frame(&mut self, handle: AnimId, frame: f32) -> TvgResult<()> {
        self.record(Call::SetFrame(handle.0, frame));
        Ok(())
    }

    fn resize(&mut self, handle: AnimId, width: f32, height: f32) -> TvgResult<()> {
        self.record(Call::Resize(handle.0, width, height));
        Ok(())
    }

    unsafe fn bind_target(&mut self, handle: AnimId, target: RenderTarget) -> TvgResult<()> {
        self.binds += 1;
        if self.fail_bind_at == Some(self.binds) {
            return Err(TvgError::engine(
                "Canvas Set Target",
                ErrorCategory::InvalidArguments,
            ));
        }
        self.targets.retain(|(id, _)| *id != handle.0);
        self.targets.push((handle.0, target));
        self.record(Call::Bind(handle.0, target.as_ptr() as usize));
        Ok(())
    }

    fn draw(&mut self, handle: AnimId) -> TvgResult<()> {
        if self.fail_draw {
            return Err(TvgError::engine("Canvas Draw", ErrorCategory::InternalCorruption));
        }
        let (_, target) = self
            .targets
            .iter()
            .find(|(id, _)| *id == handle.0)
            .copied()
            .ok_or_else(|| TvgError::engine("Canvas Draw", ErrorCategory::PreconditionNotMet))?;
        let len = target.size().pixel_count();
        // SAFETY: the playback core keeps bound targets alive until rebind or destroy.
        let px = unsafe { std::slice::from_raw_parts_mut(target.as_ptr(), len) };
        px.fill(self.fill);
        self.record(Call::Draw(handle.0));
        Ok(())
    }
}

pub fn runtime_with(engine: ScriptedEngine) -> (Runtime<ScriptedEngine>, Arc<Mutex<Log>>) {
    let log = Arc::clone(&engine.log);
    (Runtime::new(engine, RuntimeOpts::default()), log)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
