use dacl::*;

fn main() -> Result<()> {
    env_logger::init();

    let mut accounts = AccountTable::well_known();
    let mut list = acl(vec![("Everyone", "R", "Allow"), ("Administrators", "F", "Deny")])?;

    // stored order is kept for indexing
    println!("first entry added: {}", list[0]);

    // editors may modify, guests are kept out entirely
    accounts.insert(Account::new("HOST\\editors", Sid::parse("S-1-5-21-7-7-7-1010")?));
    list.append(("HOST\\editors", "M", "Allow"))?;
    list.append(("Guests", "F", "Deny"))?;

    // canonical order puts every deny first
    for entry in &list {
        println!("{}", entry);
    } // for

    if let Some(native) = list.to_native(&accounts)? {
        for entry in native.borrow().aces() {
            println!("{:#04x} {:#010x} {}", entry.ace_type, entry.mask, entry.sid);
        } // for
    } // if

    println!("{}", Acl::public().to_value());
    Ok(())
} // main
