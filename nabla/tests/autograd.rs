use itertools::Itertools;
use nabla::{Graph, Matrix, NablaError, Session, Tensor, Value};
use rand::{rngs::SmallRng, Rng, SeedableRng};

const EPS: f64 = 1e-6;
const TOLERANCE: f64 = 1e-4;

fn flatten(value: &Value) -> Vec<f64> {
    match value {
        Value::Scalar(v) => vec![*v],
        Value::Matrix(m) => m.as_slice().to_vec(),
        Value::Empty => Vec::new(),
    }
}

// Scalar loss of `build`'s output at the given parameter data.
fn eval_loss<F>(build: &F, rows: usize, cols: usize, data: &[f64]) -> f64
where
    F: Fn(&mut Graph, Tensor) -> Result<Tensor, NablaError>,
{
    let mut graph = Graph::new();
    let param = graph.tensor(Matrix::new(rows, cols, data.to_vec()));
    let out = build(&mut graph, param).unwrap();
    let loss = graph.mean(out).unwrap();
    let mut session = Session::new(&mut graph);
    session.run(&[loss]).unwrap()[0].scalar().unwrap()
}

// Compares the symbolic gradient of mean(build(param)) against a central
// finite-difference estimate, element by element.
fn check_gradient<F>(build: F, rows: usize, cols: usize, rng: &mut SmallRng)
where
    F: Fn(&mut Graph, Tensor) -> Result<Tensor, NablaError>,
{
    let data: Vec<f64> = (0..rows * cols).map(|_| rng.gen_range(-2.0..2.0)).collect();

    let mut graph = Graph::new();
    let param = graph.tensor(Matrix::new(rows, cols, data.clone()));
    let out = build(&mut graph, param).unwrap();
    let loss = graph.mean(out).unwrap();
    let grads = graph.gradients(loss, &[param]).unwrap();
    let mut session = Session::new(&mut graph);
    let symbolic = flatten(&session.run(&[grads[0]]).unwrap()[0]);

    let numeric: Vec<f64> = (0..data.len())
        .map(|i| {
            let mut plus = data.clone();
            plus[i] += EPS;
            let mut minus = data.clone();
            minus[i] -= EPS;
            (eval_loss(&build, rows, cols, &plus) - eval_loss(&build, rows, cols, &minus))
                / (2.0 * EPS)
        })
        .collect();

    for (i, (s, n)) in symbolic.iter().zip_eq(&numeric).enumerate() {
        assert!(
            (s - n).abs() < TOLERANCE,
            "element {i}: symbolic {s} vs numeric {n}"
        );
    }
}

fn random_matrix(rows: usize, cols: usize, rng: &mut SmallRng) -> Matrix {
    Matrix::new(rows, cols, (0..rows * cols).map(|_| rng.gen_range(-2.0..2.0)).collect())
}

#[test]
fn finite_difference_elementwise() {
    let mut rng = SmallRng::seed_from_u64(7);
    for _ in 0..3 {
        let rows = rng.gen_range(1..4);
        let cols = rng.gen_range(1..4);
        let other = random_matrix(rows, cols, &mut rng);
        let m = other.clone();
        check_gradient(move |g, p| { let c = g.tensor(m.clone()); g.add(p, c) }, rows, cols, &mut rng);
        let m = other.clone();
        check_gradient(move |g, p| { let c = g.tensor(m.clone()); g.sub(p, c) }, rows, cols, &mut rng);
        let m = other.clone();
        check_gradient(move |g, p| { let c = g.tensor(m.clone()); g.sub(c, p) }, rows, cols, &mut rng);
        let m = other.clone();
        check_gradient(move |g, p| { let c = g.tensor(m.clone()); g.mul(p, c) }, rows, cols, &mut rng);
    }
}

#[test]
fn finite_difference_dot() {
    let mut rng = SmallRng::seed_from_u64(11);
    for _ in 0..3 {
        let rows = rng.gen_range(1..4);
        let inner = rng.gen_range(1..4);
        let cols = rng.gen_range(1..4);
        // parameter on the left
        let right = random_matrix(inner, cols, &mut rng);
        check_gradient(
            move |g, p| { let c = g.tensor(right.clone()); g.dot(p, c) },
            rows,
            inner,
            &mut rng,
        );
        // parameter on the right
        let left = random_matrix(rows, inner, &mut rng);
        check_gradient(
            move |g, p| { let c = g.tensor(left.clone()); g.dot(c, p) },
            inner,
            cols,
            &mut rng,
        );
    }
}

#[test]
fn finite_difference_unary() {
    let mut rng = SmallRng::seed_from_u64(13);
    for _ in 0..3 {
        let rows = rng.gen_range(1..4);
        let cols = rng.gen_range(1..4);
        check_gradient(|g, p| g.transpose(p), rows, cols, &mut rng);
        check_gradient(|g, p| g.sigmoid(p), rows, cols, &mut rng);
        check_gradient(|g, p| g.square(p), rows, cols, &mut rng);
        check_gradient(|g, p| g.mean(p), rows, cols, &mut rng);
    }
}

#[test]
fn finite_difference_two_layer_network() {
    // the composite case: dot -> sigmoid -> dot -> sigmoid -> square
    let mut rng = SmallRng::seed_from_u64(17);
    let input = random_matrix(4, 2, &mut rng);
    let hidden = random_matrix(4, 1, &mut rng);
    check_gradient(
        move |g, p| {
            let x = g.tensor(input.clone());
            let w1 = g.tensor(hidden.clone());
            let z0 = g.dot(x, p)?;
            let h = g.sigmoid(z0)?;
            let z1 = g.dot(h, w1)?;
            let out = g.sigmoid(z1)?;
            g.square(out)
        },
        2,
        4,
        &mut rng,
    );
}

#[test]
fn multi_consumer_gradients_sum() -> Result<(), NablaError> {
    // z = x * x consumes x twice: dz/dx = 2x
    let mut graph = Graph::new();
    let x = graph.tensor([[3.0, -1.0]]);
    let z = graph.mul(x, x)?;
    let grads = graph.gradients(z, &[x])?;
    let mut session = Session::new(&mut graph);
    assert_eq!(session.run(&[grads[0]])?[0], [[6.0, -2.0]]);
    Ok(())
}

#[test]
fn disconnected_parameter_gets_zero_gradient() -> Result<(), NablaError> {
    let mut graph = Graph::new();
    let x = graph.tensor([[1.0, 2.0]]);
    let unrelated = graph.tensor([[5.0], [6.0]]);
    let loss = graph.mean(x)?;
    let grads = graph.gradients(loss, &[unrelated])?;
    let mut session = Session::new(&mut graph);
    assert_eq!(session.run(&[grads[0]])?[0], [[0.0], [0.0]]);
    Ok(())
}

#[test]
fn gradient_of_loss_with_respect_to_itself_is_one() -> Result<(), NablaError> {
    let mut graph = Graph::new();
    let x = graph.tensor([[1.0, 2.0]]);
    let loss = graph.mean(x)?;
    let grads = graph.gradients(loss, &[loss])?;
    let mut session = Session::new(&mut graph);
    assert_eq!(session.run(&[grads[0]])?[0], 1.0);
    Ok(())
}

#[test]
fn no_gradient_through_assign() -> Result<(), NablaError> {
    let mut graph = Graph::new();
    let param = graph.tensor(1.0);
    let next = graph.tensor(2.0);
    let update = graph.assign(param, next)?;
    let loss = graph.square(update)?;
    assert_eq!(
        graph.gradients(loss, &[param]),
        Err(NablaError::NoGradient { op: "assign" })
    );
    Ok(())
}

#[test]
fn no_gradient_through_group() -> Result<(), NablaError> {
    let mut graph = Graph::new();
    let param = graph.tensor(1.0);
    let next = graph.tensor(2.0);
    let update = graph.assign(param, next)?;
    let group = graph.group(&[update]);
    assert_eq!(
        graph.gradients(group, &[param]),
        Err(NablaError::NoGradient { op: "group" })
    );
    Ok(())
}
