pub mod manage_todos;
pub mod session;

#[cfg(test)]
mod test_support;
