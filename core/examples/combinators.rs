// crudflow/examples/combinators.rs

use crudflow::{step, Chain, ContextData, CrudError, FieldType, Parallel, Params, Sequence, Validator};
use serde_json::{json, Value};
use tracing::info;

// Context shared by the stages of the `scoring` Sequence.
#[derive(Debug, Default)]
struct Score {
  words: Vec<String>,
  letters: usize,
  longest: usize,
}

#[tokio::main]
async fn main() -> Result<(), CrudError> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Combinators Example ---");

  // 1. Validate the raw params, then pull the sentence out of them.
  let extract = step(|params: Params| async move {
    let text = params.get("text").and_then(Value::as_str).unwrap_or_default().to_string();
    Ok::<_, CrudError>(text)
  });

  // 2. Fan out: the same sentence goes to three independent branches.
  let stats = Parallel::<String, usize, CrudError>::new("stats")
    .branch(step(|s: String| async move { Ok::<_, CrudError>(s.len()) }))
    .branch(step(|s: String| async move { Ok::<_, CrudError>(s.split_whitespace().count()) }))
    .branch(step(|s: String| async move { Ok::<_, CrudError>(s.matches('e').count()) }));

  // 3. Imperative stages over one mutable context.
  let scoring = Sequence::<Score, CrudError>::new("scoring")
    .stage("letters", |ctx: ContextData<Score>| async move {
      let mut score = ctx.write();
      score.letters = score.words.iter().map(String::len).sum();
      Ok::<_, CrudError>(())
    })
    .stage("longest", |ctx: ContextData<Score>| async move {
      let mut score = ctx.write();
      score.longest = score.words.iter().map(String::len).max().unwrap_or(0);
      Ok::<_, CrudError>(())
    });

  let pipeline = Chain::new("analyze")
    .then("validate", Validator::new().required("text", FieldType::String).into_step())
    .then("extract", extract)
    .then(
      "split",
      step(|s: String| async move { Ok::<_, CrudError>(s.split_whitespace().map(str::to_string).collect::<Vec<_>>()) }),
    )
    .then(
      "score",
      scoring.into_step(
        |words: Vec<String>| Ok(Score { words, ..Score::default() }),
        |score: Score| (score.letters, score.longest),
      ),
    );

  let params = json!({ "text": "the quick brown fox jumps over the lazy dog" });
  let params = params.as_object().cloned().unwrap_or_default();

  let counts = stats.run("steady steps compose neatly".to_string()).await?;
  info!(?counts, "Parallel stats (chars, words, e's).");

  let (letters, longest) = pipeline.run(params).await?;
  info!(letters, longest, steps = ?pipeline.step_names(), "Chain finished.");

  match pipeline.run(Params::new()).await {
    Err(e) => info!("Missing text rejected as expected: {}", e),
    Ok(_) => info!("Unexpected success."),
  }

  Ok(())
}
