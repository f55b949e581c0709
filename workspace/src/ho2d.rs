use std::{ path::PathBuf, time::Instant };
use anyhow::{ bail, Context };
use clap::Parser;
use log::{ info, warn };
use ndarray as nd;
use num_complex::Complex64 as C64;
use tdse2d::{
    backend::{ CpuDevice, OffloadSolver },
    config::{ self, RunConfig },
    solver::Solver,
    timedep::TResult,
    utils,
};

// evolve a Gaussian wavepacket sitting at the bottom of a 2D harmonic trap

const X0: f64 = 0.0;
const Y0: f64 = 0.0;
const WIDTH: f64 = 2.06;
const KX: f64 = 0.0;
const KY: f64 = 0.0;

#[derive(Parser)]
#[command(about = "Evolve a Gaussian wavepacket in a 2D harmonic potential")]
struct Args {
    /// Path to a TOML run configuration; built-in defaults are used if omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of steps to take, overriding the configured run length
    #[arg(short, long)]
    steps: Option<usize>,

    /// Step on a separate (CPU reference) device instead of the host
    #[arg(long)]
    offload: bool,
}

enum Stepper {
    Host(Solver),
    Device(OffloadSolver<CpuDevice>),
}

impl Stepper {
    fn step(&mut self) -> TResult<()> {
        match self {
            Self::Host(solver) => solver.step(),
            Self::Device(offload) => offload.step(),
        }
    }

    fn solver(&self) -> &Solver {
        match self {
            Self::Host(solver) => solver,
            Self::Device(offload) => offload.solver(),
        }
    }
}

// ψ(x, y) = A exp(i (kx x + ky y)) exp(-((x - x0)² + (y - y0)²) / w²)
//
// rows index y, columns index x
fn gaussian<S>(x: &nd::ArrayBase<S, nd::Ix1>, y: &nd::ArrayBase<S, nd::Ix1>)
    -> nd::Array2<C64>
where S: nd::Data<Elem = f64>
{
    let amp = (2.0 * std::f64::consts::PI).sqrt().recip();
    nd::Array2::from_shape_fn((y.len(), x.len()), |(i, j)| {
        let (xj, yi) = (x[j], y[i]);
        let r2 = (xj - X0).powi(2) + (yi - Y0).powi(2);
        amp * C64::cis(KX * xj + KY * yi) * (-r2 / WIDTH.powi(2)).exp()
    })
}

// V(x, y) = (x² + y²) / 9
fn harmonic<S>(x: &nd::ArrayBase<S, nd::Ix1>, y: &nd::ArrayBase<S, nd::Ix1>)
    -> nd::Array2<f64>
where S: nd::Data<Elem = f64>
{
    nd::Array2::from_shape_fn((y.len(), x.len()), |(i, j)| {
        (x[j].powi(2) + y[i].powi(2)) / 9.0
    })
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config: RunConfig
        = match args.config.as_ref() {
            Some(path) => config::read_toml(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => RunConfig::default(),
        };

    let x = config.grid.x();
    let y = config.grid.y();
    let v0 = harmonic(&x, &y);
    let (re, im) = utils::from_complex(&gaussian(&x, &y));
    let solver = Solver::from_config(
        &v0, &re, &im, config.grid.dx(), config.grid.dy(), &config.solver)?;

    let mut stepper
        = if args.offload {
            match OffloadSolver::new(solver.clone(), CpuDevice::new()) {
                Ok(offload) => Stepper::Device(offload),
                Err(err) => {
                    warn!("falling back to host stepping: {err}");
                    Stepper::Host(solver)
                },
            }
        } else {
            Stepper::Host(solver)
        };

    let steps = args.steps
        .unwrap_or_else(|| config.run.num_steps(stepper.solver().params().dt));
    let span = config.run.span.max(1);
    info!("norm: {:.6}", stepper.solver().norm());
    info!("taking {steps} steps");

    let begin = Instant::now();
    for k in 1..=steps {
        stepper.step()?;
        if k % span == 0 {
            let norm = stepper.solver().norm();
            if !norm.is_finite() {
                bail!("wavefunction diverged at t = {}", stepper.solver().time());
            }
            info!("t = {:.6}: norm = {:.6}", stepper.solver().time(), norm);
        }
    }

    info!(
        "calculation terminated, time elapsed: {:.3} s",
        begin.elapsed().as_secs_f64(),
    );
    info!("norm: {:.6}", stepper.solver().norm());
    Ok(())
}
