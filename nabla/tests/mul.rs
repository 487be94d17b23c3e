use nabla::{Graph, NablaError, Session};

#[test]
fn mul() -> Result<(), NablaError> {
    let mut graph = Graph::new();
    let x = graph.tensor([[2.0, 4.0], [3.0, 5.0]]);
    let y = graph.tensor([[3.0, 1.0], [2.0, 2.0]]);
    let z = graph.mul(x, y)?;
    let grads = graph.gradients(z, &[x, y])?;
    let mut session = Session::new(&mut graph);
    let values = session.run(&[z, grads[0], grads[1]])?;
    assert_eq!(values[0], [[6.0, 4.0], [6.0, 10.0]]);
    // gradient of each operand is the other operand
    assert_eq!(values[1], [[3.0, 1.0], [2.0, 2.0]]);
    assert_eq!(values[2], [[2.0, 4.0], [3.0, 5.0]]);
    Ok(())
}

#[test]
fn mul_by_scalar() -> Result<(), NablaError> {
    let mut graph = Graph::new();
    let x = graph.tensor([[1.0, 2.0], [3.0, 4.0]]);
    let s = graph.tensor(3.0);
    let z = graph.mul(x, s)?;
    let mut session = Session::new(&mut graph);
    assert_eq!(session.run(&[z])?[0], [[3.0, 6.0], [9.0, 12.0]]);
    Ok(())
}
