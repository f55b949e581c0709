use ndarray as nd;
use tdse2d::{
    config::RunConfig,
    error::{ ConfigError, TError },
    grid::{ pad, unpad },
    scheme::Scheme,
    solver::Solver,
    timedep::Params,
    utils,
};

fn gaussian(n: usize, dx: f64, w: f64) -> (nd::Array2<f64>, nd::Array2<f64>) {
    let c = (n - 1) as f64 / 2.0;
    let amp = (2.0 * std::f64::consts::PI).sqrt().recip();
    let kx = 1.5;
    let mut re: nd::Array2<f64> = nd::Array2::zeros((n, n));
    let mut im: nd::Array2<f64> = nd::Array2::zeros((n, n));
    nd::Zip::indexed(&mut re).and(&mut im)
        .for_each(|(i, j), re_ij, im_ij| {
            let x = (j as f64 - c) * dx;
            let y = (i as f64 - c) * dx;
            let env = amp * (-(x * x + y * y) / (w * w)).exp();
            *re_ij = env * (kx * x).cos();
            *im_ij = env * (kx * x).sin();
        });
    (re, im)
}

#[test]
fn zero_input_stays_zero() {
    for (n, params) in [
        (1, Params::default()),
        (4, Params::new(0.1, 0.2, 0.01)),
        (9, Params::new(2.0, 0.5, -3.0).with_hbar(0.3).with_mass(7.0)),
    ] {
        let z: nd::Array2<f64> = nd::Array2::zeros((n, n));
        let mut solver = Solver::new(&z, &z, &z, params, Scheme::Forward).unwrap();
        solver.step().unwrap();
        assert_eq!(solver.re_part(), z);
        assert_eq!(solver.im_part(), z);
    }
}

#[test]
fn padding_round_trip() {
    for n in [1, 3, 10] {
        let g: nd::Array2<f64> = nd::Array2::ones((n, n));
        let p = pad(&g);
        let a = p.as_array();
        assert_eq!(a.dim(), (n + 2, n + 2));
        assert!(a.row(0).iter().chain(a.row(n + 1).iter()).all(|x| *x == 0.0));
        assert!(a.column(0).iter().chain(a.column(n + 1).iter()).all(|x| *x == 0.0));
        assert_eq!(unpad(&p), g);
    }
}

#[test]
fn two_by_two_scenario() {
    let v0: nd::Array2<f64> = nd::Array2::ones((2, 2));
    let re: nd::Array2<f64> = nd::Array2::zeros((2, 2));
    let im: nd::Array2<f64> = nd::Array2::ones((2, 2));
    let mut solver = Solver::new(&v0, &re, &im, Params::default(), Scheme::Forward)
        .unwrap();
    solver.step().unwrap();
    // potential term: -1 - 2(1/2) - 2(1/2) = -3; each cell sees one non-ring
    // neighbor per axis
    assert_eq!(solver.re_part(), nd::array![[2.0, 2.0], [2.0, 2.0]]);
    assert_eq!(solver.im_part(), nd::array![[1.0, 1.0], [1.0, 1.0]]);
}

#[test]
fn norm_stays_bounded_for_small_dt() {
    let n = 31;
    let dx = 0.5;
    let (re, im) = gaussian(n, dx, 2.06);
    let v0: nd::Array2<f64> = nd::Array2::zeros((n, n));
    let params = Params::new(dx, dx, 1e-3);
    assert!(params.dt < params.ftcs_dt_limit());
    let mut solver = Solver::new(&v0, &re, &im, params, Scheme::Forward).unwrap();
    let norm0 = solver.norm();
    for _ in 0..10 {
        solver.step().unwrap();
        let norm = solver.norm();
        assert!(norm.is_finite());
        assert!(norm < 1.01 * norm0, "norm grew from {norm0} to {norm}");
    }
    assert!(utils::all_finite(&solver.re_view(), &solver.im_view()));
}

#[test]
fn identical_solvers_agree_bitwise() {
    let n = 17;
    let (re, im) = gaussian(n, 0.4, 1.5);
    let v0 = nd::Array2::from_shape_fn((n, n), |(i, j)| {
        ((i as f64 - 8.0).powi(2) + (j as f64 - 8.0).powi(2)) / 9.0
    });
    let params = Params::new(0.4, 0.3, 2e-3).with_hbar(1.1).with_mass(0.9);
    let mut a = Solver::new(&v0, &re, &im, params, Scheme::Forward).unwrap();
    let mut b = Solver::new(&v0, &re, &im, params, Scheme::Forward).unwrap();
    a.step_n(25).unwrap();
    b.step_n(25).unwrap();
    assert_eq!(a.re_part(), b.re_part());
    assert_eq!(a.im_part(), b.im_part());
}

#[test]
fn mismatched_potential_is_rejected() {
    let v0: nd::Array2<f64> = nd::Array2::zeros((4, 4));
    let psi: nd::Array2<f64> = nd::Array2::zeros((3, 3));
    let res = Solver::with_defaults(&v0, &psi, &psi, 1.0, 1.0, 1.0);
    assert!(matches!(res, Err(ConfigError::Shape(_))));
}

#[test]
fn unknown_scheme_is_rejected_before_construction() {
    assert!("unknown".parse::<Scheme>().is_err());
    let res: Result<RunConfig, _> = "[solver]\nscheme = \"unknown\"".parse();
    assert!(res.is_err());
}

#[test]
fn implicit_schemes_fail_without_touching_psi() {
    let (re, im) = gaussian(5, 1.0, 1.0);
    let v0: nd::Array2<f64> = nd::Array2::zeros((5, 5));
    for scheme in ["backward", "ctcs"] {
        let scheme: Scheme = scheme.parse().unwrap();
        let mut solver = Solver::new(&v0, &re, &im, Params::default(), scheme).unwrap();
        assert!(matches!(solver.step(), Err(TError::Unimplemented(s)) if s == scheme));
        assert_eq!(solver.re_part(), re);
        assert_eq!(solver.im_part(), im);
    }
}

#[test]
fn negative_dt_reverses_a_step_approximately() {
    let n = 15;
    let (re, im) = gaussian(n, 0.5, 2.0);
    let v0: nd::Array2<f64> = nd::Array2::zeros((n, n));
    let fwd = Params::new(0.5, 0.5, 1e-4);
    let bwd = Params { dt: -1e-4, ..fwd };
    let mut a = Solver::new(&v0, &re, &im, fwd, Scheme::Forward).unwrap();
    a.step().unwrap();
    let mut b = Solver::new(&v0, &a.re_part(), &a.im_part(), bwd, Scheme::Forward).unwrap();
    b.step().unwrap();
    let err = (&b.re_part() - &re).iter()
        .chain((&b.im_part() - &im).iter())
        .fold(0.0_f64, |acc, x| acc.max(x.abs()));
    assert!(err < 1e-5, "round-trip error {err}");
}
