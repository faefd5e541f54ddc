/// Run `body` against staged copies of `ledger` and `router`, committing
/// them back only when it succeeds. This gives a settlement call the same
/// all-or-nothing behavior a reverting on-chain transaction has.
pub fn atomically<L, R, T, E, F>(ledger: &mut L, router: &mut R, body: F) -> Result<T, E>
where
    L: Clone,
    R: Clone,
    F: FnOnce(&mut L, &mut R) -> Result<T, E>,
{
    let mut staged_ledger = ledger.clone();
    let mut staged_router = router.clone();

    let output = body(&mut staged_ledger, &mut staged_router)?;

    *ledger = staged_ledger;
    *router = staged_router;

    Ok(output)
}
