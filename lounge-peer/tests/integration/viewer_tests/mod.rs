mod test_negotiation;
mod test_sinks;
