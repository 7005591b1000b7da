use phonk::EvaluationContext;

fn main() -> anyhow::Result<()> {
    let program = vec![
        "(sto make_counter (phonk () (block (sto counts (dict-new)) (dict-add counts 0 0) (phonk () (dict-add counts 0 (+ (dict-get counts 0) 1))))))",
        "(sto tick (make_counter))",
        "(tick)",
        "(tick)",
        "(sto add5 (make_adder 5))",
        "(sto x 999)",
        "(add5 3)",
        "(fib 60)",
        "(sqrt 2)",
        "(undefined 1)",
    ];

    let mut context = EvaluationContext::new()?;
    for source in program {
        match context.evaluate_str(source) {
            Ok(value) => println!("{}: {}", source, value),
            Err(err) => println!("{}: {}", source, err),
        }
    }

    Ok(())
}
