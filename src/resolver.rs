//! Spec resolution
//!
//! Walks the completed tokens of a command line against one
//! [`CommandSpec`] tree and reports what may be typed at the cursor.
//!
//! Per token, left to right:
//! 1. a pending option value consumes the token (optional and variadic
//!    values yield to a token that names an option or subcommand)
//! 2. an option label sets the pending marker if the option takes values
//! 3. a subcommand label descends into that subcommand, but only before the
//!    first positional argument of the current node
//! 4. anything else consumes the next positional argument; a variadic
//!    argument keeps consuming
//!
//! The cursor token itself never drives a transition.

use crate::spec::{ArgSpec, CommandSpec, OptionSpec};

/// Which kinds of suggestions are valid at the cursor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SuggestionCategories {
    pub arguments: bool,
    pub subcommands: bool,
    pub options: bool,
}

impl SuggestionCategories {
    pub fn is_empty(&self) -> bool {
        !(self.arguments || self.subcommands || self.options)
    }
}

/// Result of walking a spec tree up to the cursor
#[derive(Clone, Debug)]
pub struct ResolutionContext<'a> {
    /// The subcommand node the cursor is in
    pub node: &'a CommandSpec,
    /// Argument expecting a value at the cursor, if any
    pub arg: Option<&'a ArgSpec>,
    pub subcommands: &'a [CommandSpec],
    /// The node's own options followed by inherited persistent ones
    pub options: Vec<&'a OptionSpec>,
    pub categories: SuggestionCategories,
}

#[derive(Clone, Copy, Debug)]
struct PendingOption<'a> {
    option: &'a OptionSpec,
    index: usize,
    taken: usize,
}

impl<'a> PendingOption<'a> {
    fn new(option: &'a OptionSpec) -> Self {
        Self {
            option,
            index: 0,
            taken: 0,
        }
    }

    fn arg(&self) -> &'a ArgSpec {
        &self.option.args[self.index]
    }

    /// Marker after one value was consumed
    fn consume(self) -> Option<Self> {
        if self.arg().is_variadic {
            return Some(Self {
                taken: self.taken + 1,
                ..self
            });
        }
        let index = self.index + 1;
        (index < self.option.args.len()).then_some(Self {
            option: self.option,
            index,
            taken: 0,
        })
    }
}

/// Resolve `tokens` (the completed words between the command name and the
/// cursor) against `spec`
pub fn resolve<'a, S: AsRef<str>>(spec: &'a CommandSpec, tokens: &[S]) -> ResolutionContext<'a> {
    walk(spec, tokens, Vec::new())
}

fn walk<'a, S: AsRef<str>>(
    node: &'a CommandSpec,
    tokens: &[S],
    inherited: Vec<&'a OptionSpec>,
) -> ResolutionContext<'a> {
    let mut options: Vec<&'a OptionSpec> = node.options.iter().collect();
    for option in inherited {
        if !options.iter().any(|o| std::ptr::eq(*o, option)) {
            options.push(option);
        }
    }

    let mut arg_index = 0;
    let mut consumed_positional = false;
    let mut pending: Option<PendingOption<'a>> = None;

    for (i, token) in tokens.iter().enumerate() {
        let token = token.as_ref();

        if let Some(p) = pending {
            let arg = p.arg();
            let yields = (arg.is_variadic || arg.is_optional)
                && (find_option(&options, token).is_some()
                    || (!consumed_positional && node.find_subcommand(token).is_some()));
            if !yields {
                tracing::trace!(token, option = ?p.option.name.first(), "resolve.option_value");
                pending = p.consume();
                continue;
            }
            pending = None;
        }

        if let Some(option) = find_option(&options, token) {
            tracing::trace!(token, "resolve.option");
            if option.takes_value() {
                pending = Some(PendingOption::new(option));
            }
            continue;
        }

        // `--name=value` carries its own value
        if let Some((name, _)) = token.split_once('=') {
            if find_option(&options, name).is_some_and(|o| o.takes_value()) {
                tracing::trace!(token, "resolve.option_with_value");
                continue;
            }
        }

        if !consumed_positional {
            if let Some(sub) = node.find_subcommand(token) {
                tracing::trace!(token, "resolve.subcommand");
                let persistent = options.iter().copied().filter(|o| o.is_persistent).collect();
                return walk(sub, &tokens[i + 1..], persistent);
            }
        }

        match node.args.get(arg_index) {
            Some(arg) => {
                tracing::trace!(token, arg = ?arg.name, "resolve.positional");
                consumed_positional = true;
                if !arg.is_variadic {
                    arg_index += 1;
                }
            }
            None => tracing::trace!(token, "resolve.unmatched"),
        }
    }

    let (arg, categories) = match pending {
        Some(p) => {
            let arg = p.arg();
            let categories = SuggestionCategories {
                arguments: true,
                subcommands: false,
                options: arg.is_optional || p.taken > 0,
            };
            (Some(arg), categories)
        }
        None => {
            let arg = node.args.get(arg_index);
            let categories = SuggestionCategories {
                arguments: arg.is_some(),
                subcommands: !consumed_positional,
                options: true,
            };
            (arg, categories)
        }
    };

    ResolutionContext {
        node,
        arg,
        subcommands: &node.subcommands,
        options,
        categories,
    }
}

fn find_option<'a>(options: &[&'a OptionSpec], label: &str) -> Option<&'a OptionSpec> {
    options.iter().copied().find(|o| o.has_label(label))
}
