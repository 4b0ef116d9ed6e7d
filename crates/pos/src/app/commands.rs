use std::collections::HashMap;

use nexus_engine::{CategoryFilter, ProductId};
use tracing::warn;

use super::pos::{Currency, ProductDraft, SetupForm};

/// A typed terminal line, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PosCommand {
    Help,
    Products,
    Tab { filter: CategoryFilter },
    Add { product_id: ProductId },
    Qty { product_id: ProductId, delta: i32 },
    Cart,
    Table { table: u32 },
    Pay,
    Confirm,
    Cancel,
    Setup { form: SetupForm },
    NewProduct { draft: ProductDraft },
    Reset,
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandParseError {
    reason: String,
    usage: String,
}

impl CommandParseError {
    fn new(reason: impl Into<String>, usage: &str) -> Self {
        Self {
            reason: reason.into(),
            usage: usage.to_string(),
        }
    }
}

type ParseFn = fn(&[String]) -> Result<PosCommand, CommandParseError>;

#[derive(Clone, Copy)]
pub(crate) struct CommandSpec {
    name: &'static str,
    help: &'static str,
    arg_schema: &'static str,
    parse: ParseFn,
}

const BUILTIN_COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "help",
        help: "List commands",
        arg_schema: "",
        parse: parse_help_command,
    },
    CommandSpec {
        name: "products",
        help: "List products on the active tab",
        arg_schema: "",
        parse: parse_products_command,
    },
    CommandSpec {
        name: "tab",
        help: "Switch category tab",
        arg_schema: "<category|all>",
        parse: parse_tab_command,
    },
    CommandSpec {
        name: "add",
        help: "Add one product to the cart",
        arg_schema: "<product_id:u64>",
        parse: parse_add_command,
    },
    CommandSpec {
        name: "qty",
        help: "Change a cart line quantity",
        arg_schema: "<product_id:u64> <delta:i32>",
        parse: parse_qty_command,
    },
    CommandSpec {
        name: "cart",
        help: "Show cart and totals",
        arg_schema: "",
        parse: parse_cart_command,
    },
    CommandSpec {
        name: "table",
        help: "Select a table (0 clears)",
        arg_schema: "<table:u32>",
        parse: parse_table_command,
    },
    CommandSpec {
        name: "pay",
        help: "Send the order to the kitchen",
        arg_schema: "",
        parse: parse_pay_command,
    },
    CommandSpec {
        name: "confirm",
        help: "Accept the open dialog",
        arg_schema: "",
        parse: parse_confirm_command,
    },
    CommandSpec {
        name: "cancel",
        help: "Dismiss the open dialog",
        arg_schema: "",
        parse: parse_cancel_command,
    },
    CommandSpec {
        name: "setup",
        help: "Complete store setup",
        arg_schema: "<store_name> <tables:u32> <language> <currency:usd|php|eur|jpy>",
        parse: parse_setup_command,
    },
    CommandSpec {
        name: "new_product",
        help: "Add a product to the catalog",
        arg_schema: "<name> <price> <category>",
        parse: parse_new_product_command,
    },
    CommandSpec {
        name: "reset",
        help: "Factory reset (asks first)",
        arg_schema: "",
        parse: parse_reset_command,
    },
    CommandSpec {
        name: "status",
        help: "Show demo engine status",
        arg_schema: "",
        parse: parse_status_command,
    },
    CommandSpec {
        name: "quit",
        help: "Quit app",
        arg_schema: "",
        parse: parse_quit_command,
    },
];

pub(crate) struct CommandRegistry {
    specs: Vec<CommandSpec>,
    lookup_by_lower_name: HashMap<String, usize>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl CommandRegistry {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            lookup_by_lower_name: HashMap::new(),
        }
    }

    pub(crate) fn with_builtins() -> Self {
        let mut registry = Self::new();
        for spec in BUILTIN_COMMANDS {
            if let Err(reason) = registry.register(*spec) {
                warn!(command = spec.name, reason = %reason, "command_registration_failed");
            }
        }
        registry
    }

    pub(crate) fn register(&mut self, spec: CommandSpec) -> Result<(), String> {
        if spec.name.trim().is_empty() {
            return Err("command name cannot be empty".to_string());
        }
        let lower = spec.name.to_ascii_lowercase();
        if self.lookup_by_lower_name.contains_key(&lower) {
            return Err(format!("duplicate command registration: {}", spec.name));
        }

        self.specs.push(spec);
        self.lookup_by_lower_name
            .insert(lower, self.specs.len() - 1);
        Ok(())
    }

    fn lookup(&self, input_name: &str) -> Option<&CommandSpec> {
        let lower = input_name.to_ascii_lowercase();
        let index = self.lookup_by_lower_name.get(&lower)?;
        self.specs.get(*index)
    }

    /// Registration order.
    pub(crate) fn help_lines(&self) -> Vec<String> {
        self.specs
            .iter()
            .map(|spec| {
                if spec.arg_schema.is_empty() {
                    format!("{} - {}", spec.name, spec.help)
                } else {
                    format!("{} {} - {}", spec.name, spec.arg_schema, spec.help)
                }
            })
            .collect()
    }

    /// `Ok(None)` for a blank line. Errors come back ready to print.
    pub(crate) fn parse_line(&self, raw_line: &str) -> Result<Option<PosCommand>, String> {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        let tokens = tokenize_line(trimmed).map_err(|reason| format!("error: {reason}. usage: help"))?;
        let Some((command_name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let Some(spec) = self.lookup(command_name) else {
            return Err(format!("error: unknown command '{command_name}'. try: help"));
        };

        (spec.parse)(args)
            .map(Some)
            .map_err(|error| format!("error: {}. usage: {}", error.reason, error.usage))
    }
}

fn tokenize_line(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut seen_token_content = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                seen_token_content = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if seen_token_content {
                    tokens.push(std::mem::take(&mut current));
                    seen_token_content = false;
                }
            }
            _ => {
                current.push(ch);
                seen_token_content = true;
            }
        }
    }

    if in_quotes {
        return Err("unterminated quoted string".to_string());
    }
    if seen_token_content {
        tokens.push(current);
    }

    Ok(tokens)
}

fn parse_help_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "help")?;
    Ok(PosCommand::Help)
}

fn parse_products_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "products")?;
    Ok(PosCommand::Products)
}

fn parse_tab_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    let [category] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <category>",
            "tab <category|all>",
        ));
    };
    Ok(PosCommand::Tab {
        filter: CategoryFilter::from_label(category),
    })
}

fn parse_add_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    let [raw_id] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <product_id>",
            "add <product_id>",
        ));
    };
    Ok(PosCommand::Add {
        product_id: parse_product_id(raw_id, "add <product_id>")?,
    })
}

fn parse_qty_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    const USAGE: &str = "qty <product_id> <delta>";
    let [raw_id, raw_delta] = args else {
        return Err(CommandParseError::new(
            "expected <product_id> <delta>",
            USAGE,
        ));
    };
    let product_id = parse_product_id(raw_id, USAGE)?;
    let delta = raw_delta.parse::<i32>().map_err(|_| {
        CommandParseError::new(format!("invalid delta '{raw_delta}' (expected i32)"), USAGE)
    })?;
    Ok(PosCommand::Qty { product_id, delta })
}

fn parse_cart_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "cart")?;
    Ok(PosCommand::Cart)
}

fn parse_table_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    let [raw_table] = args else {
        return Err(CommandParseError::new(
            "expected exactly one argument <table>",
            "table <table>",
        ));
    };
    let table = raw_table.parse::<u32>().map_err(|_| {
        CommandParseError::new(
            format!("invalid table '{raw_table}' (expected u32)"),
            "table <table>",
        )
    })?;
    Ok(PosCommand::Table { table })
}

fn parse_pay_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "pay")?;
    Ok(PosCommand::Pay)
}

fn parse_confirm_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "confirm")?;
    Ok(PosCommand::Confirm)
}

fn parse_cancel_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "cancel")?;
    Ok(PosCommand::Cancel)
}

fn parse_setup_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    const USAGE: &str = "setup <store_name> <tables> <language> <currency>";
    let [store_name, raw_tables, language, raw_currency] = args else {
        return Err(CommandParseError::new(
            "expected <store_name> <tables> <language> <currency>",
            USAGE,
        ));
    };
    let table_count = raw_tables.parse::<u32>().map_err(|_| {
        CommandParseError::new(format!("invalid table count '{raw_tables}' (expected u32)"), USAGE)
    })?;
    let currency = Currency::parse(raw_currency).ok_or_else(|| {
        CommandParseError::new(
            format!("unknown currency '{raw_currency}' (expected usd|php|eur|jpy)"),
            USAGE,
        )
    })?;
    Ok(PosCommand::Setup {
        form: SetupForm {
            store_name: store_name.clone(),
            table_count,
            language: language.clone(),
            currency,
        },
    })
}

fn parse_new_product_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    let [name, price, category] = args else {
        return Err(CommandParseError::new(
            "expected <name> <price> <category>",
            "new_product <name> <price> <category>",
        ));
    };
    Ok(PosCommand::NewProduct {
        draft: ProductDraft {
            name: name.clone(),
            price: price.clone(),
            category: category.clone(),
        },
    })
}

fn parse_reset_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "reset")?;
    Ok(PosCommand::Reset)
}

fn parse_status_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "status")?;
    Ok(PosCommand::Status)
}

fn parse_quit_command(args: &[String]) -> Result<PosCommand, CommandParseError> {
    require_no_args(args, "quit")?;
    Ok(PosCommand::Quit)
}

fn parse_product_id(raw: &str, usage: &str) -> Result<ProductId, CommandParseError> {
    let trimmed = raw.strip_prefix('#').unwrap_or(raw);
    trimmed
        .parse::<u64>()
        .map(ProductId)
        .map_err(|_| CommandParseError::new(format!("invalid product id '{raw}' (expected u64)"), usage))
}

fn require_no_args(args: &[String], usage: &str) -> Result<(), CommandParseError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(CommandParseError::new("unexpected extra arguments", usage))
    }
}
