#[cfg(test)]
mod bootstrap;
#[cfg(test)]
mod utils;
