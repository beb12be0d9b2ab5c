//! Model listing functionality
//!
//! Lists the built-in model catalog with token limits and pricing, and
//! estimates the cost of a single exchange.

use crate::core::catalog::{catalog, ModelId, Price};

fn format_price(price: &Price) -> String {
    format!("${} / {} tokens", price.amount, price.unit)
}

pub fn list_models(default: ModelId) {
    let catalog = catalog();

    println!("🤖 Supported Models");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();
    println!("🎯 Default model: {default}");
    println!();

    for &model in catalog.models() {
        let marker = if model == default { "*" } else { "•" };
        let limits = catalog.limits(model);
        let pricing = catalog.pricing(model);
        println!("  {marker} {model}");
        println!("    Max tokens: {}", limits.max_tokens);
        println!("    Prompt: {}", format_price(&pricing.prompt));
        println!("    Completion: {}", format_price(&pricing.completion));
        println!();
    }
}

pub fn print_cost_estimate(model: ModelId, prompt_tokens: u64, completion_tokens: u64) {
    let pricing = model.pricing();
    println!("💰 Cost estimate for {model}");
    println!(
        "  Prompt: {prompt_tokens} tokens = ${:.6}",
        pricing.prompt.cost(prompt_tokens)
    );
    println!(
        "  Completion: {completion_tokens} tokens = ${:.6}",
        pricing.completion.cost(completion_tokens)
    );
    println!(
        "  Total: ${:.6}",
        pricing.estimate(prompt_tokens, completion_tokens)
    );
}
