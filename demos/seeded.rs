use optnet::prelude::*;

fn main() -> Result<()> {
  let metrics = Metrics::new(0.82, 0.64, 350.0);

  // fresh weights every call, answers may flip between runs
  for _ in 0..5 {
    println!("unseeded: {}", analyze_metrics(metrics.cpu_usage, metrics.memory_usage, metrics.active_connections));
  }

  let analyzer = AnalyzerBuilder::new()
    .seed(2024)
    .weight_range(-1.0..1.0)
    .build()?;

  for _ in 0..5 {
    let analysis = analyzer.analyze(&metrics)?;
    println!("seeded: p={:.4} optimize={}", analysis.probability, analysis.needs_optimization);
  }

  Ok(())
}
