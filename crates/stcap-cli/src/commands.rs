pub mod annotate;
pub mod search;

#[cfg(test)]
mod test_support;
