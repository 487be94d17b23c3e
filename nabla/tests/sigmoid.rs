use nabla::{Graph, NablaError, Session};

fn assert_close(x: f64, y: f64) {
    assert!((x - y).abs() < 1e-12, "{x} is not {y}");
}

#[test]
fn sigmoid() -> Result<(), NablaError> {
    let mut graph = Graph::new();
    let x = graph.tensor([[0.0, 1.0], [-1.0, 2.0]]);
    let z = graph.sigmoid(x)?;
    let mut session = Session::new(&mut graph);
    let values = session.run(&[z])?;
    let m = values[0].matrix().unwrap();
    assert_close(m.get(0, 0), 0.5);
    assert_close(m.get(0, 1), 0.7310585786300049);
    assert_close(m.get(1, 0), 0.2689414213699951);
    assert_close(m.get(1, 1), 0.8807970779778823);
    Ok(())
}

#[test]
fn sigmoid_gradient_at_zero() -> Result<(), NablaError> {
    // s(0) = 0.5, s'(0) = s(0) * (1 - s(0)) = 0.25
    let mut graph = Graph::new();
    let x = graph.tensor(0.0);
    let z = graph.sigmoid(x)?;
    let grads = graph.gradients(z, &[x])?;
    let mut session = Session::new(&mut graph);
    let values = session.run(&[z, grads[0]])?;
    assert_eq!(values[0], 0.5);
    assert_eq!(values[1], 0.25);
    Ok(())
}
