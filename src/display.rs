use alloy::primitives::utils::format_units;
use alloy::primitives::U256;

use crate::quoting::{Quote, TradeDirection};
use crate::routing::Route;
use crate::trade::{TradeOutput, TradeState};

/// Human amount, trimmed to six decimals
pub fn format_amount(amount: U256, decimals: u8) -> String {
    let Ok(formatted) = format_units(amount, decimals) else {
        return amount.to_string();
    };
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac: String = frac.chars().take(6).collect();
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => formatted,
    }
}

pub fn print_trade_output(output: &TradeOutput, slippage_bps: u32) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("  TRADE | {}", output.state);
    println!("═══════════════════════════════════════════════════════════════");
    println!();

    let Some(trade) = &output.trade else {
        match output.state {
            TradeState::Invalid => println!("  Request incomplete."),
            _ => println!(
                "\x1b[1;31m  No route found ({} candidates).\x1b[0m",
                output.routes.len()
            ),
        }
        println!();
        return;
    };

    let input = trade.route.input();
    let output_asset = trade.route.output();

    println!("  ROUTE ({}):", trade.route.kind());
    for (i, step) in trade.route.steps().iter().enumerate() {
        let fee = trade.fees.get(i).copied().unwrap_or_default();
        println!(
            "    {}. {:<40} {:>8}",
            i + 1,
            step.to_string(),
            if fee == 0 { "-".to_string() } else { format!("{:.2}%", fee as f64 / 10_000.0) }
        );
    }
    println!();

    println!("  AMOUNTS:");
    println!(
        "    In:             {} {}",
        format_amount(trade.input_amount, input.decimals),
        input
    );
    println!(
        "    Out:            {} {}",
        format_amount(trade.output_amount, output_asset.decimals),
        output_asset
    );
    println!(
        "    Execution Price: {} {}/{}",
        trade.execution_price().round_dp(6),
        output_asset,
        input
    );
    println!("    Price Impact:   {}%", trade.price_impact);
    println!();

    println!("  BOUNDS ({} bps slippage):", slippage_bps);
    match trade.direction {
        TradeDirection::ExactIn => println!(
            "    Minimum Out:    {} {}",
            format_amount(trade.minimum_amount_out(slippage_bps), output_asset.decimals),
            output_asset
        ),
        TradeDirection::ExactOut => println!(
            "    Maximum In:     {} {}",
            format_amount(trade.maximum_amount_in(slippage_bps), input.decimals),
            input
        ),
    }
    println!("    Gas Estimate:   {}", trade.gas_estimate());
    println!();
}

/// Every candidate with its quote, in scan order
pub fn print_routes(routes: &[Route], quotes: &[Option<Quote>]) {
    println!();
    println!("  {:<4} {:<8} {:<60} {:>18}", "#", "KIND", "PATH", "AMOUNT");
    println!("  {}", "─".repeat(4 + 1 + 8 + 1 + 60 + 1 + 18));

    for (i, route) in routes.iter().enumerate() {
        let amount = match quotes.get(i).and_then(Option::as_ref) {
            Some(quote) => match quote.direction {
                TradeDirection::ExactIn => {
                    format_amount(quote.output_amount(), route.output().decimals)
                }
                TradeDirection::ExactOut => {
                    format_amount(quote.input_amount(), route.input().decimals)
                }
            },
            None => "\x1b[1;31mfailed\x1b[0m".to_string(),
        };
        println!(
            "  {:<4} {:<8} {:<60} {:>18}",
            i + 1,
            route.kind().to_string(),
            route.token_path(),
            amount
        );
    }

    if routes.is_empty() {
        println!("  No candidate routes.");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(2_000_000u64), 6), "2");
        assert_eq!(format_amount(U256::from(1u64), 18), "0");
        assert_eq!(format_amount(U256::from(123_456_789u64), 8), "1.234567");
    }
}
