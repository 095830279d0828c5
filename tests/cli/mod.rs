mod output_contracts;
mod parse_help_parity;
