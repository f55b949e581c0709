//! Offloading time steps to a separate compute device.
//!
//! A [`Device`] holds its own copy of the padded grids ("device memory"). The
//! host uploads every buffer once with [`Device::init_device_memory`], asks for
//! steps with [`Device::execute_kernel`], and copies ψ back whole with
//! [`Device::retrieve_results`]; there is no partial synchronization.
//! [`OffloadSolver`] wires this protocol to a [`Solver`], and surfaces every
//! device failure as a [`DeviceError`] instead of aborting.
//!
//! [`CpuDevice`] is the reference implementation, running the same kernels as
//! [`Solver`] on device-side copies of the data.

use log::{ debug, info, warn };
use ndarray as nd;
use crate::{
    error::DeviceError,
    grid::{ Padded, pad },
    scheme::Scheme,
    solver::Solver,
    timedep::{ self, Params, TResult },
};

/// Borrowed, flattened view of a simulation state for upload to a device.
///
/// All buffers are padded, row-major, and `ncols × ncols` long.
#[derive(Copy, Clone, Debug)]
pub struct HostData<'a> {
    pub v0: &'a [f64],
    pub re: &'a [f64],
    pub im: &'a [f64],
    /// Linear dimension of the padded grids
    pub ncols: usize,
    pub params: Params,
}

impl<'a> HostData<'a> {
    /// Describe the current state of `solver`.
    pub fn from_solver(solver: &'a Solver) -> Result<Self, DeviceError> {
        let (v0, re, im) = solver.padded();
        Ok(Self {
            v0: v0.as_slice().ok_or(DeviceError::Layout)?,
            re: re.as_slice().ok_or(DeviceError::Layout)?,
            im: im.as_slice().ok_or(DeviceError::Layout)?,
            ncols: v0.dim().1,
            params: *solver.params(),
        })
    }

    /// Check that every buffer holds `ncols²` values and that `ncols` leaves
    /// room for an interior.
    pub fn check(&self) -> Result<(), DeviceError> {
        if self.ncols < 3 { return Err(DeviceError::BadDimension(self.ncols)); }
        let len = self.ncols * self.ncols;
        DeviceError::check_len(len, self.v0.len())?;
        DeviceError::check_len(len, self.re.len())?;
        DeviceError::check_len(len, self.im.len())?;
        Ok(())
    }
}

/// A compute device able to run time steps on its own copy of the grids.
pub trait Device {
    /// Human-readable device name, for logging.
    fn name(&self) -> &str;

    /// Allocate device memory and upload the potential, ψ, and parameters.
    ///
    /// Calling this again replaces whatever the device held before.
    fn init_device_memory(&mut self, host: &HostData<'_>) -> Result<(), DeviceError>;

    /// Take a single step on the device with the given scheme.
    fn execute_kernel(&mut self, scheme: Scheme) -> TResult<()>;

    /// Copy the device's current ψ into padded, row-major host buffers.
    ///
    /// Only interior cells are meaningful; [`OffloadSolver`] zeroes the ring
    /// of whatever is written here.
    fn retrieve_results(&self, re: &mut [f64], im: &mut [f64]) -> Result<(), DeviceError>;

    /// Release all device memory. Safe to call more than once.
    fn clean_up_device(&mut self);
}

#[derive(Clone, Debug)]
struct CpuMemory {
    v0: Padded,
    re: Padded,
    im: Padded,
    re_next: Padded,
    im_next: Padded,
    params: Params,
}

/// Reference [`Device`] that keeps its buffers in ordinary host memory.
#[derive(Clone, Debug, Default)]
pub struct CpuDevice {
    mem: Option<CpuMemory>,
}

impl CpuDevice {
    pub fn new() -> Self { Self::default() }

    /// Whether device memory is currently allocated.
    pub fn is_initialized(&self) -> bool { self.mem.is_some() }
}

// re-pad the interior of a flat padded buffer, so the ring is zero regardless
// of what the host sent
fn upload(buf: &[f64], ncols: usize) -> Result<Padded, DeviceError> {
    let full = nd::ArrayView2::from_shape((ncols, ncols), buf)
        .map_err(|_| DeviceError::BufferLength { expected: ncols * ncols, got: buf.len() })?;
    Ok(pad(&full.slice(nd::s![1..ncols - 1, 1..ncols - 1])))
}

fn download(src: &Padded, dst: &mut [f64]) -> Result<(), DeviceError> {
    let src = src.as_array();
    DeviceError::check_len(src.len(), dst.len())?;
    dst.iter_mut().zip(src.iter()).for_each(|(d, s)| { *d = *s; });
    Ok(())
}

impl Device for CpuDevice {
    fn name(&self) -> &str { "cpu" }

    fn init_device_memory(&mut self, host: &HostData<'_>) -> Result<(), DeviceError> {
        host.check()?;
        let n = host.ncols - 2;
        self.mem = Some(CpuMemory {
            v0: upload(host.v0, host.ncols)?,
            re: upload(host.re, host.ncols)?,
            im: upload(host.im, host.ncols)?,
            re_next: Padded::zeros((n, n)),
            im_next: Padded::zeros((n, n)),
            params: host.params,
        });
        Ok(())
    }

    fn execute_kernel(&mut self, scheme: Scheme) -> TResult<()> {
        let mem = self.mem.as_mut().ok_or(DeviceError::NotInitialized)?;
        timedep::step(
            scheme,
            &mem.params,
            &mem.v0,
            &mem.re,
            &mem.im,
            &mut mem.re_next,
            &mut mem.im_next,
        )?;
        std::mem::swap(&mut mem.re, &mut mem.re_next);
        std::mem::swap(&mut mem.im, &mut mem.im_next);
        Ok(())
    }

    fn retrieve_results(&self, re: &mut [f64], im: &mut [f64]) -> Result<(), DeviceError> {
        let mem = self.mem.as_ref().ok_or(DeviceError::NotInitialized)?;
        download(&mem.re, re)?;
        download(&mem.im, im)?;
        Ok(())
    }

    fn clean_up_device(&mut self) { self.mem = None; }
}

/// A [`Solver`] whose steps run on a [`Device`].
///
/// The host copy of ψ is refreshed from the device after every step, so the
/// [`Solver`] accessors (see [`Self::solver`]) always reflect the latest
/// successful step. Device memory is released on drop.
pub struct OffloadSolver<D: Device> {
    host: Solver,
    device: D,
    // false when device memory may not match `host`
    synced: bool,
}

impl<D: Device> OffloadSolver<D> {
    /// Upload the state of `host` to `device`.
    ///
    /// If the upload fails, the device is cleaned up and the error is
    /// returned; the caller can fall back to stepping a clone of `host`
    /// directly.
    pub fn new(host: Solver, mut device: D) -> Result<Self, DeviceError> {
        let init = HostData::from_solver(&host)
            .and_then(|data| device.init_device_memory(&data));
        if let Err(err) = init {
            warn!("offload: failed to initialize device {}: {err}", device.name());
            device.clean_up_device();
            return Err(err);
        }
        info!("offload: initialized device {} for a {n}×{n} grid", device.name(), n = host.size());
        Ok(Self { host, device, synced: true })
    }

    /// Advance ψ by one time step on the device and copy it back.
    ///
    /// On error, the host copy keeps the previous ψ and the device is reloaded
    /// from it, so a later step starts from the same state on both sides. If
    /// the reload fails too, it is retried at the start of the next step.
    pub fn step(&mut self) -> TResult<()> {
        if !self.synced { self.resync()?; }
        if let Err(err) = self.try_step() {
            warn!("offload: step failed on device {}: {err}", self.device.name());
            if let Err(sync_err) = self.resync() {
                warn!("offload: failed to reload device {}: {sync_err}", self.device.name());
            }
            return Err(err);
        }
        debug!("offload: step {} (t = {})", self.host.steps(), self.host.time());
        Ok(())
    }

    fn try_step(&mut self) -> TResult<()> {
        self.synced = false;
        self.device.execute_kernel(self.host.scheme())?;
        let device = &self.device;
        self.host.commit_with(|re, im| {
            let re = re.as_slice_mut().ok_or(DeviceError::Layout)?;
            let im = im.as_slice_mut().ok_or(DeviceError::Layout)?;
            device.retrieve_results(re, im)
        })?;
        self.synced = true;
        Ok(())
    }

    // replace device memory with the current host state
    fn resync(&mut self) -> Result<(), DeviceError> {
        self.synced = false;
        self.device.clean_up_device();
        let data = HostData::from_solver(&self.host)?;
        self.device.init_device_memory(&data)?;
        self.synced = true;
        Ok(())
    }

    /// Advance ψ by `n` time steps, stopping at the first error.
    pub fn step_n(&mut self, n: usize) -> TResult<()> {
        (0..n).try_for_each(|_| self.step())
    }

    /// Host-side state, refreshed after every successful step.
    pub fn solver(&self) -> &Solver { &self.host }

    /// The underlying device.
    pub fn device(&self) -> &D { &self.device }
}

impl<D: Device> Drop for OffloadSolver<D> {
    fn drop(&mut self) {
        self.device.clean_up_device();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{ cell::Cell, rc::Rc };
    use crate::error::TError;

    fn solver(scheme: Scheme) -> Solver {
        let n = 6;
        let v0 = nd::Array2::from_shape_fn((n, n), |(i, j)| 0.1 * (i + j) as f64);
        let re = nd::Array2::from_shape_fn((n, n), |(i, j)| ((i * n + j) as f64).sin());
        let im = nd::Array2::from_shape_fn((n, n), |(i, j)| ((i + 2 * j) as f64).cos());
        Solver::new(&v0, &re, &im, Params::new(0.5, 0.5, 1e-3), scheme).unwrap()
    }

    #[test]
    fn cpu_device_matches_host() {
        let mut host = solver(Scheme::Forward);
        let mut offload = OffloadSolver::new(host.clone(), CpuDevice::new()).unwrap();
        host.step_n(10).unwrap();
        offload.step_n(10).unwrap();
        assert_eq!(offload.solver().re_part(), host.re_part());
        assert_eq!(offload.solver().im_part(), host.im_part());
        assert_eq!(offload.solver().steps(), 10);
    }

    #[test]
    fn unimplemented_scheme_on_device() {
        let mut offload = OffloadSolver::new(solver(Scheme::Centered), CpuDevice::new())
            .unwrap();
        let before = offload.solver().re_part();
        assert!(matches!(offload.step(), Err(TError::Unimplemented(Scheme::Centered))));
        assert_eq!(offload.solver().re_part(), before);
    }

    #[test]
    fn uninitialized_device_errors() {
        let mut dev = CpuDevice::new();
        assert!(matches!(
            dev.execute_kernel(Scheme::Forward),
            Err(TError::Device(DeviceError::NotInitialized))
        ));
        let mut buf = vec![0.0; 9];
        let mut buf2 = vec![0.0; 9];
        assert!(matches!(
            dev.retrieve_results(&mut buf, &mut buf2),
            Err(DeviceError::NotInitialized)
        ));
    }

    #[test]
    fn bad_host_data_is_rejected() {
        let v = vec![0.0; 16];
        let short = vec![0.0; 15];
        let mut dev = CpuDevice::new();
        let data = HostData { v0: &v, re: &v, im: &short, ncols: 4, params: Params::default() };
        assert!(matches!(
            dev.init_device_memory(&data),
            Err(DeviceError::BufferLength { expected: 16, got: 15 })
        ));
        let data = HostData { v0: &v[..4], re: &v[..4], im: &v[..4], ncols: 2, params: Params::default() };
        assert!(matches!(dev.init_device_memory(&data), Err(DeviceError::BadDimension(2))));
        assert!(!dev.is_initialized());
    }

    #[test]
    fn upload_zeroes_the_ring() {
        let v = vec![1.0; 9];
        let mut dev = CpuDevice::new();
        let data = HostData { v0: &v, re: &v, im: &v, ncols: 3, params: Params::default() };
        dev.init_device_memory(&data).unwrap();
        let mut re = vec![0.0; 9];
        let mut im = vec![0.0; 9];
        dev.retrieve_results(&mut re, &mut im).unwrap();
        assert_eq!(re, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
    }

    struct BrokenDevice {
        cleanups: Rc<Cell<usize>>,
    }

    impl Device for BrokenDevice {
        fn name(&self) -> &str { "broken" }

        fn init_device_memory(&mut self, _host: &HostData<'_>) -> Result<(), DeviceError> {
            Err(DeviceError::Unavailable("no device present".into()))
        }

        fn execute_kernel(&mut self, _scheme: Scheme) -> TResult<()> {
            Err(DeviceError::NotInitialized.into())
        }

        fn retrieve_results(&self, _re: &mut [f64], _im: &mut [f64]) -> Result<(), DeviceError> {
            Err(DeviceError::NotInitialized)
        }

        fn clean_up_device(&mut self) { self.cleanups.set(self.cleanups.get() + 1); }
    }

    #[test]
    fn init_failure_is_recoverable() {
        let cleanups = Rc::new(Cell::new(0));
        let host = solver(Scheme::Forward);
        let res = OffloadSolver::new(host.clone(), BrokenDevice { cleanups: cleanups.clone() });
        assert!(matches!(res, Err(DeviceError::Unavailable(_))));
        assert!(cleanups.get() >= 1);

        // fall back to stepping on the host
        let mut host = host;
        host.step().unwrap();
        assert_eq!(host.steps(), 1);
    }

    // wraps a CpuDevice, failing or misbehaving on request
    struct Faulty {
        inner: CpuDevice,
        inits: usize,
        max_inits: usize,
        bad_retrievals: Cell<usize>,
        ring_value: Option<f64>,
    }

    impl Faulty {
        fn new() -> Self {
            Self {
                inner: CpuDevice::new(),
                inits: 0,
                max_inits: usize::MAX,
                bad_retrievals: Cell::new(0),
                ring_value: None,
            }
        }
    }

    impl Device for Faulty {
        fn name(&self) -> &str { "faulty" }

        fn init_device_memory(&mut self, host: &HostData<'_>) -> Result<(), DeviceError> {
            if self.inits >= self.max_inits {
                return Err(DeviceError::Unavailable("out of memory".into()));
            }
            self.inits += 1;
            self.inner.init_device_memory(host)
        }

        fn execute_kernel(&mut self, scheme: Scheme) -> TResult<()> {
            self.inner.execute_kernel(scheme)
        }

        fn retrieve_results(&self, re: &mut [f64], im: &mut [f64]) -> Result<(), DeviceError> {
            if self.bad_retrievals.get() > 0 {
                self.bad_retrievals.set(self.bad_retrievals.get() - 1);
                return Err(DeviceError::Unavailable("transfer failed".into()));
            }
            self.inner.retrieve_results(re, im)?;
            if let Some(x) = self.ring_value {
                let n = re.len();
                re[0] = x;
                re[n - 1] = x;
                im[0] = x;
                im[n - 1] = x;
            }
            Ok(())
        }

        fn clean_up_device(&mut self) { self.inner.clean_up_device(); }
    }

    #[test]
    fn failed_retrieval_reloads_device() {
        let mut host = solver(Scheme::Forward);
        let dev = Faulty { bad_retrievals: Cell::new(1), ..Faulty::new() };
        let mut offload = OffloadSolver::new(host.clone(), dev).unwrap();
        assert!(matches!(offload.step(), Err(TError::Device(DeviceError::Unavailable(_)))));
        assert_eq!(offload.solver().steps(), 0);
        assert_eq!(offload.device().inits, 2);

        offload.step().unwrap();
        host.step().unwrap();
        assert_eq!(offload.solver().steps(), 1);
        assert_eq!(offload.solver().time(), host.time());
        assert_eq!(offload.solver().re_part(), host.re_part());
        assert_eq!(offload.solver().im_part(), host.im_part());
    }

    #[test]
    fn failed_reload_blocks_later_steps() {
        let dev = Faulty { max_inits: 1, bad_retrievals: Cell::new(1), ..Faulty::new() };
        let mut offload = OffloadSolver::new(solver(Scheme::Forward), dev).unwrap();
        let before = offload.solver().re_part();
        assert!(offload.step().is_err());
        assert!(matches!(offload.step(), Err(TError::Device(DeviceError::Unavailable(_)))));
        assert!(!offload.device().inner.is_initialized());
        assert_eq!(offload.solver().steps(), 0);
        assert_eq!(offload.solver().re_part(), before);
    }

    #[test]
    fn retrieved_ring_is_cleared() {
        let mut host = solver(Scheme::Forward);
        let dev = Faulty { ring_value: Some(9.0), ..Faulty::new() };
        let mut offload = OffloadSolver::new(host.clone(), dev).unwrap();
        offload.step_n(2).unwrap();
        host.step_n(2).unwrap();
        let (_, re, im) = offload.solver().padded();
        for p in [re, im] {
            let a = p.as_array();
            let (nr, nc) = a.dim();
            assert!(
                a.indexed_iter()
                    .filter(|((i, j), _)| *i == 0 || *j == 0 || *i == nr - 1 || *j == nc - 1)
                    .all(|(_, x)| *x == 0.0)
            );
        }
        assert_eq!(offload.solver().re_part(), host.re_part());
        assert_eq!(offload.solver().im_part(), host.im_part());
    }

    #[test]
    fn drop_cleans_up() {
        let cleanups = Rc::new(Cell::new(0));
        struct Counting {
            inner: CpuDevice,
            cleanups: Rc<Cell<usize>>,
        }
        impl Device for Counting {
            fn name(&self) -> &str { "counting" }
            fn init_device_memory(&mut self, host: &HostData<'_>) -> Result<(), DeviceError> {
                self.inner.init_device_memory(host)
            }
            fn execute_kernel(&mut self, scheme: Scheme) -> TResult<()> {
                self.inner.execute_kernel(scheme)
            }
            fn retrieve_results(&self, re: &mut [f64], im: &mut [f64]) -> Result<(), DeviceError> {
                self.inner.retrieve_results(re, im)
            }
            fn clean_up_device(&mut self) {
                self.inner.clean_up_device();
                self.cleanups.set(self.cleanups.get() + 1);
            }
        }
        let dev = Counting { inner: CpuDevice::new(), cleanups: cleanups.clone() };
        let offload = OffloadSolver::new(solver(Scheme::Forward), dev).unwrap();
        assert!(offload.device().inner.is_initialized());
        drop(offload);
        assert_eq!(cleanups.get(), 1);
    }
}
