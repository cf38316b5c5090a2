/// Converts a list of expressions (each of whom implement ToString) to a Vec<String>.
/// Used to assemble helm command arguments.
#[macro_export]
macro_rules! vec_to_strings {
    ($($x:expr),* $(,)?) => (vec![$($x.to_string()),*]);
}
