use nabla::{Graph, NablaError, Session};
use rand::{rngs::SmallRng, SeedableRng};

// Two-layer sigmoid network learning XOR with plain gradient descent.
fn main() -> Result<(), NablaError> {
    let mut rng = SmallRng::seed_from_u64(67);
    let mut graph = Graph::new();

    // training data: the XOR truth table
    let x = graph.tensor([[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]]);
    let y = graph.tensor([[0.0, 1.0, 1.0, 0.0]]);

    let weights0 = graph.uniform(2, 4, -1.0..1.0, &mut rng);
    let weights1 = graph.uniform(4, 1, -1.0..1.0, &mut rng);

    let z0 = graph.dot(x, weights0)?;
    let activations0 = graph.sigmoid(z0)?;
    let z1 = graph.dot(activations0, weights1)?;
    let activations1 = graph.sigmoid(z1)?;

    // mean squared error against the transposed targets
    let target = graph.transpose(y)?;
    let residual = graph.sub(target, activations1)?;
    let squared = graph.square(residual)?;
    let loss = graph.mean(squared)?;

    let parameters = [weights0, weights1];
    let gradients = graph.gradients(loss, &parameters)?;
    let mut updates = Vec::new();
    for (param, grad) in parameters.into_iter().zip(gradients) {
        let stepped = graph.sub(param, grad)?;
        updates.push(graph.assign(param, stepped)?);
    }
    let update = graph.group(&updates);

    let mut session = Session::new(&mut graph);
    for epoch in 0..10_000 {
        let values = session.run(&[update, loss])?;
        if epoch % 1_000 == 0 {
            println!("epoch {epoch:>5}  loss {:.8}", values[1].scalar().unwrap());
        }
    }

    let values = session.run(&[loss, activations1])?;
    println!("final loss {:.8}", values[0].scalar().unwrap());
    println!("predictions:\n{:.3}", values[1]);
    Ok(())
}
